//! Kubernetes integration module.
//!
//! This module provides read access to the cluster the service runs in:
//!
//! - [`ClusterApi`]: the two queries discovery needs (server version, node list)
//! - [`KubeClusterApi`]: the implementation backed by a [`kube::Client`]
//! - [`KubernetesError`]: errors raised by those queries

pub mod cluster_api;
pub mod types;

pub use cluster_api::ClusterApi;
pub use cluster_api::KubeClusterApi;
pub use types::KubernetesError;

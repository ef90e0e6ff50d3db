//! Periodic Kubernetes node discovery for elchi.
//!
//! Each cycle lists the cluster's nodes, classifies them into a [`api_types::DiscoveryReport`]
//! and posts it to the elchi collection endpoint.

pub mod app;
pub mod config;
pub mod delivery;
pub mod infrastructure;
pub mod inventory;

// Re-export main modules
pub use infrastructure::k8s;
pub use infrastructure::kube_client;

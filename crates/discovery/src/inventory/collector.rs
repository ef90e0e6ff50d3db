use std::collections::BTreeMap;
use std::time::Instant;

use api_types::ClusterInfo;
use api_types::DiscoveryReport;
use api_types::NodeRecord;
use chrono::Utc;
use error_stack::Report;
use k8s_openapi::api::core::v1::Node;
use tracing::debug;
use tracing::warn;

use crate::infrastructure::k8s::ClusterApi;
use crate::infrastructure::k8s::KubernetesError;
use crate::inventory::classifier;

/// Reported when the API server version cannot be queried.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Builds a [`DiscoveryReport`] from the cluster's current node list.
pub struct Collector<C> {
    cluster: C,
    cluster_name: String,
}

impl<C: ClusterApi> Collector<C> {
    pub fn new(cluster: C, cluster_name: impl Into<String>) -> Self {
        Self {
            cluster,
            cluster_name: cluster_name.into(),
        }
    }

    /// Take one snapshot of the cluster.
    ///
    /// The server version is best effort and falls back to [`UNKNOWN_VERSION`]. An empty
    /// cluster yields an empty report. `duration` covers the two API queries only, node
    /// normalization is not included.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::ListNodesFailed`] if the node list cannot be fetched
    #[tracing::instrument(skip(self), fields(cluster = %self.cluster_name))]
    pub async fn collect(&self) -> Result<DiscoveryReport, Report<KubernetesError>> {
        let started = Instant::now();

        let cluster = self.cluster_info().await;
        let nodes = self.cluster.list_nodes().await?;
        let duration = started.elapsed();
        let records: Vec<NodeRecord> = nodes.iter().map(node_record).collect();

        debug!(node_count = records.len(), "Collected node inventory");

        Ok(DiscoveryReport::new(
            Utc::now(),
            cluster,
            records,
            format!("{duration:?}"),
        ))
    }

    async fn cluster_info(&self) -> ClusterInfo {
        let version = match self.cluster.server_version().await {
            Ok(version) => version,
            Err(e) => {
                warn!("Falling back to unknown cluster version: {e:?}");
                UNKNOWN_VERSION.to_string()
            }
        };

        ClusterInfo {
            name: self.cluster_name.clone(),
            version,
        }
    }
}

/// Normalize a single node. Repeated address types keep the last address.
pub fn node_record(node: &Node) -> NodeRecord {
    let classification = classifier::classify(node);
    let status = node.status.as_ref();

    let version = status
        .and_then(|s| s.node_info.as_ref())
        .map(|info| info.kubelet_version.clone())
        .unwrap_or_default();

    let addresses = status
        .and_then(|s| s.addresses.as_ref())
        .map(|addresses| {
            addresses
                .iter()
                .map(|a| (a.type_.clone(), a.address.clone()))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    NodeRecord {
        name: node.metadata.name.clone().unwrap_or_default(),
        roles: classification.roles,
        status: classification.status,
        version,
        addresses,
    }
}

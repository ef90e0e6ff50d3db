use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::Api;
use kube::Client;

use crate::infrastructure::k8s::types::KubernetesError;

/// Read-only view of the cluster API used by discovery.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Git version of the API server, e.g. `v1.28.2`.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::ServerVersionFailed`] if the version endpoint is unreachable
    async fn server_version(&self) -> Result<String, Report<KubernetesError>>;

    /// Every node currently visible to the API.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::ListNodesFailed`] if the list call fails
    async fn list_nodes(&self) -> Result<Vec<Node>, Report<KubernetesError>>;
}

/// [`ClusterApi`] backed by a live [`Client`].
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn server_version(&self) -> Result<String, Report<KubernetesError>> {
        let info = self
            .client
            .apiserver_version()
            .await
            .change_context(KubernetesError::ServerVersionFailed {
                message: "GET /version failed".to_string(),
            })?;
        Ok(info.git_version)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, Report<KubernetesError>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api.list(&ListParams::default()).await.map_err(|e| {
            Report::new(KubernetesError::ListNodesFailed {
                message: e.to_string(),
            })
        })?;
        Ok(nodes.items)
    }
}

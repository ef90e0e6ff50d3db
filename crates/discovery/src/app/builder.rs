use anyhow::Result;
use tracing::info;

use crate::app::Application;
use crate::config::Config;
use crate::delivery::DeliveryClient;
use crate::infrastructure::k8s::KubeClusterApi;
use crate::infrastructure::kube_client;
use crate::inventory::Collector;

/// Application builder
pub struct ApplicationBuilder {
    config: Config,
}

impl ApplicationBuilder {
    /// Create new application builder
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the application against the cluster this process runs in
    pub async fn build(self) -> Result<Application<KubeClusterApi>> {
        info!("Building application components...");

        let client = kube_client::init_kube_client(self.config.kubeconfig.clone())
            .await
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        let collector = Collector::new(KubeClusterApi::new(client), self.config.cluster_name);

        let delivery = DeliveryClient::new(self.config.delivery)
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;

        Ok(Application::new(
            collector,
            delivery,
            self.config.discovery_interval,
            self.config.print_payload,
        ))
    }
}

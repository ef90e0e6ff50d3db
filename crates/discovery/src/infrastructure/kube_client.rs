use std::path::Path;
use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;
use tracing::info;
use tracing::warn;

use crate::infrastructure::k8s::KubernetesError;

/// Build a client for the cluster this process runs in.
///
/// The in-cluster service account is tried first. An explicit kubeconfig skips it and is
/// only meant for running outside the cluster during development; without one, the
/// default kubeconfig is the last resort.
pub async fn init_kube_client(
    kubeconfig: Option<PathBuf>,
) -> Result<Client, Report<KubernetesError>> {
    let config = match kubeconfig {
        Some(path) => {
            let config = config_from_kubeconfig(&path).await?;
            info!(kubeconfig = %path.display(), "Using explicit kubeconfig");
            config
        }
        None => match Config::incluster() {
            Ok(config) => {
                info!("Using in-cluster service account");
                config
            }
            Err(e) => {
                warn!("In-cluster config unavailable, falling back to default kubeconfig: {e}");
                Config::infer()
                    .await
                    .change_context(KubernetesError::ConnectionFailed {
                        message: "No in-cluster config and no usable kubeconfig, this service must run inside a Kubernetes cluster or be given a kubeconfig".to_string(),
                    })?
            }
        },
    };

    Client::try_from(config).change_context(KubernetesError::ConnectionFailed {
        message: "Failed to create Kubernetes client".to_string(),
    })
}

async fn config_from_kubeconfig(path: &Path) -> Result<Config, Report<KubernetesError>> {
    let kubeconfig =
        Kubeconfig::read_from(path).change_context(KubernetesError::ConnectionFailed {
            message: format!("Failed to read kubeconfig file: {}", path.display()),
        })?;

    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .change_context(KubernetesError::ConnectionFailed {
            message: format!(
                "Failed to create config from kubeconfig: {}",
                path.display()
            ),
        })
}

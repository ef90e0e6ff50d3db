use core::error::Error;

/// Errors that can occur during Kubernetes operations.
#[derive(Debug, derive_more::Display)]
pub enum KubernetesError {
    #[display("Failed to connect to Kubernetes API: {message}")]
    ConnectionFailed { message: String },
    #[display("Failed to list nodes: {message}")]
    ListNodesFailed { message: String },
    #[display("Failed to query server version: {message}")]
    ServerVersionFailed { message: String },
}

impl Error for KubernetesError {}

//! Error types for report delivery.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, Report<DeliveryError>>;

/// Errors that can occur while delivering a report.
///
/// None of these are retried; the next tick simply sends a fresh report.
#[derive(Debug, Display)]
pub enum DeliveryError {
    /// The credential has no `--` separating the id from the project
    #[display("invalid token format: expected 'uuid--project' format")]
    InvalidCredentialFormat,

    /// The envelope could not be encoded
    #[display("failed to marshal discovery payload: {message}")]
    Serialization { message: String },

    /// Connection, DNS, timeout or malformed endpoint URL
    #[display("failed to send request: {message}")]
    Transport { message: String },

    /// Non-2xx status without a readable error body
    #[display("API returned non-success status: {status}")]
    HttpStatus { status: u16 },

    /// Non-2xx status with an error message in the body
    #[display("API error (HTTP {status}): {message}")]
    RemoteRejection { status: u16, message: String },

    /// 2xx status whose body reports `success: false`
    #[display("API processing failed: {message}")]
    RemoteProcessing { message: String },

    /// The HTTP client could not be built
    #[display("delivery client configuration error: {message}")]
    Configuration { message: String },
}

impl DeliveryError {
    /// Whether the endpoint was reached and refused the report.
    pub const fn is_remote_rejection(&self) -> bool {
        matches!(
            self,
            DeliveryError::HttpStatus { .. }
                | DeliveryError::RemoteRejection { .. }
                | DeliveryError::RemoteProcessing { .. }
        )
    }
}

impl Error for DeliveryError {}

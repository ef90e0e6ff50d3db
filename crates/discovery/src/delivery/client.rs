//! HTTP client posting discovery reports to the collection endpoint.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use api_types::ApiResponse;
use api_types::DeliveryEnvelope;
use api_types::DiscoveryReport;
use error_stack::Report;
use error_stack::ResultExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::delivery::error::DeliveryError;
use crate::delivery::error::DeliveryResult;
use crate::delivery::token::extract_project;

/// Marks requests as coming from this service.
pub const FROM_ELCHI_HEADER: &str = "from-elchi";
/// `true` until the endpoint has confirmed a delivery from this client.
pub const INITIAL_HEADER: &str = "initial";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PAYLOAD_PREVIEW_LEN: usize = 200;

/// Delivery client config.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// collection endpoint, empty disables delivery
    pub endpoint: String,
    /// `uuid--project` credential, sent as a bearer token
    pub token: String,
    /// skip TLS certificate verification
    pub insecure_skip_verify: bool,
    /// whole round trip timeout
    pub request_timeout: Duration,
}

impl DeliveryConfig {
    /// create new delivery config with default parameters.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            insecure_skip_verify: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// set TLS verification bypass.
    pub fn with_insecure_skip_verify(mut self, insecure_skip_verify: bool) -> Self {
        self.insecure_skip_verify = insecure_skip_verify;
        self
    }

    /// set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// How a send that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// No endpoint configured, nothing was sent
    Skipped,
    /// The endpoint confirmed the report
    Delivered,
    /// 2xx status but the acknowledgment body was unreadable
    DeliveredUnacknowledged,
}

/// Posts reports to the collection endpoint.
///
/// The client remembers whether the endpoint has ever confirmed a delivery and
/// advertises it through the [`INITIAL_HEADER`] on every request.
pub struct DeliveryClient {
    config: DeliveryConfig,
    http: Client,
    initial_completed: AtomicBool,
}

impl DeliveryClient {
    /// create client
    pub fn new(config: DeliveryConfig) -> DeliveryResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()
            .change_context(DeliveryError::Configuration {
                message: "Failed to create HTTP client".into(),
            })?;

        Ok(Self {
            config,
            http,
            initial_completed: AtomicBool::new(false),
        })
    }

    /// Whether the endpoint has confirmed at least one delivery from this client.
    pub fn initial_completed(&self) -> bool {
        self.initial_completed.load(Ordering::Acquire)
    }

    /// Wrap a report with the project derived from the configured credential.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::InvalidCredentialFormat`] if the credential has no project
    pub fn envelope<'a>(
        &self,
        report: &'a DiscoveryReport,
    ) -> DeliveryResult<DeliveryEnvelope<'a>> {
        let project = extract_project(&self.config.token)
            .ok_or_else(|| Report::new(DeliveryError::InvalidCredentialFormat))?;

        Ok(DeliveryEnvelope {
            project: project.to_string(),
            data: report,
        })
    }

    /// Send one report.
    ///
    /// Returns [`DeliveryOutcome::Skipped`] without touching the network when no endpoint
    /// is configured. Nothing is retried.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::InvalidCredentialFormat`] if the credential has no project
    /// - [`DeliveryError::Serialization`] if the envelope cannot be encoded
    /// - [`DeliveryError::Transport`] if the request cannot be completed
    /// - [`DeliveryError::HttpStatus`] or [`DeliveryError::RemoteRejection`] on a non-2xx status
    /// - [`DeliveryError::RemoteProcessing`] if a 2xx body reports `success: false`
    pub async fn send(&self, report: &DiscoveryReport) -> DeliveryResult<DeliveryOutcome> {
        let endpoint = self.config.endpoint.as_str();
        if endpoint.is_empty() {
            debug!("No API endpoint configured, skipping send");
            return Ok(DeliveryOutcome::Skipped);
        }

        let envelope = self.envelope(report)?;
        let project = envelope.project.as_str();
        debug!(project_id = %project, "Extracted project from token");

        let body = serde_json::to_vec(&envelope).map_err(|e| {
            Report::new(DeliveryError::Serialization {
                message: e.to_string(),
            })
        })?;

        debug!(
            endpoint = %endpoint,
            project = %project,
            payload_size = body.len(),
            json_preview = %payload_preview(&body),
            "Sending discovery payload to API"
        );

        let initial = if self.initial_completed() { "false" } else { "true" };
        let mut request = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(FROM_ELCHI_HEADER, "yes")
            .header(INITIAL_HEADER, initial);
        if !self.config.token.is_empty() {
            request = request.bearer_auth(&self.config.token);
        }

        let response = request.body(body).send().await.map_err(|e| {
            Report::new(DeliveryError::Transport {
                message: e.to_string(),
            })
        })?;

        let status = response.status();
        let body = response.bytes().await;

        if !status.is_success() {
            let api_error = body
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ApiResponse>(&bytes).ok())
                .map(|r| r.error)
                .filter(|message| !message.is_empty());

            return match api_error {
                Some(message) => {
                    error!(
                        status_code = status.as_u16(),
                        endpoint = %endpoint,
                        project = %project,
                        error = %message,
                        "API returned error response"
                    );
                    Err(Report::new(DeliveryError::RemoteRejection {
                        status: status.as_u16(),
                        message,
                    }))
                }
                None => {
                    error!(
                        status_code = status.as_u16(),
                        endpoint = %endpoint,
                        project = %project,
                        "API returned non-success HTTP status"
                    );
                    Err(Report::new(DeliveryError::HttpStatus {
                        status: status.as_u16(),
                    }))
                }
            };
        }

        let decoded = body.map_err(|e| e.to_string()).and_then(|bytes| {
            serde_json::from_slice::<ApiResponse>(&bytes).map_err(|e| e.to_string())
        });
        let api_response = match decoded {
            Ok(api_response) => api_response,
            Err(e) => {
                warn!(
                    status_code = status.as_u16(),
                    endpoint = %endpoint,
                    project = %project,
                    error = %e,
                    "Failed to parse API response, but HTTP status indicates success"
                );
                return Ok(DeliveryOutcome::DeliveredUnacknowledged);
            }
        };

        if !api_response.success {
            error!(
                status_code = status.as_u16(),
                endpoint = %endpoint,
                project = %project,
                error = %api_response.error,
                "API reported processing error for discovery result"
            );
            return Err(Report::new(DeliveryError::RemoteProcessing {
                message: api_response.error,
            }));
        }

        self.initial_completed.store(true, Ordering::Release);
        info!(
            status_code = status.as_u16(),
            endpoint = %endpoint,
            project = %project,
            api_message = %api_response.message,
            "Discovery result processed successfully by API"
        );
        Ok(DeliveryOutcome::Delivered)
    }
}

fn payload_preview(body: &[u8]) -> String {
    if body.len() <= PAYLOAD_PREVIEW_LEN {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!("{}...", String::from_utf8_lossy(&body[..PAYLOAD_PREVIEW_LEN]))
}

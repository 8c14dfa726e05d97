//! Email delivery through an HTTP provider API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use lexalert_core::config::NotifierConfig;
use lexalert_core::error::AppError;

use super::{Notifier, NotifyError, ReminderMessage};

/// Request body posted to the provider.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    to_name: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Posts each reminder as JSON to a provider send endpoint.
#[derive(Debug)]
pub struct HttpNotifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl HttpNotifier {
    /// Create a notifier from configuration. The client timeout is the
    /// configured send timeout.
    pub fn new(config: &NotifierConfig) -> Result<Self, AppError> {
        if config.endpoint.trim().is_empty() {
            return Err(AppError::configuration(
                "notifier.endpoint is required for the http provider",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.send_timeout())
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build notifier HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

/// Whether a provider status code is worth retrying.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<(), NotifyError> {
        let body = SendRequest {
            from: &self.from_address,
            to: &message.to,
            to_name: &message.to_name,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Idempotency-Key", message.idempotency_key.to_string())
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transient(format!("Provider request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, "Provider accepted reminder");
            return Ok(());
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        warn!(status = status.as_u16(), body = %text, "Provider returned error");

        let detail = format!("provider returned {status}: {text}");
        if is_retryable_status(status) {
            Err(NotifyError::Transient(detail))
        } else {
            Err(NotifyError::Rejected(detail))
        }
    }
}

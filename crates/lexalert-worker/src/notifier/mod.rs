//! Outbound reminder delivery.
//!
//! A [`Notifier`] sends one composed [`ReminderMessage`]. Its error says
//! whether the same send could succeed later ([`NotifyError::Transient`])
//! or never will ([`NotifyError::Rejected`]); the reminder job maps those
//! onto retry and dead-letter.

pub mod http;
pub mod log;
pub mod template;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use lexalert_core::config::{NotifierConfig, NotifierProvider};
use lexalert_core::error::AppError;

pub use http::HttpNotifier;
pub use log::LogNotifier;

/// A composed reminder ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderMessage {
    /// Recipient address.
    pub to: String,
    /// Recipient display name.
    pub to_name: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// Stable per job; lets the provider drop duplicate sends.
    pub idempotency_key: Uuid,
}

/// Errors returned by a notifier.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Timeout, connection failure or provider-side outage.
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// The provider refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Delivers reminder messages.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Send one message.
    async fn send(&self, message: &ReminderMessage) -> Result<(), NotifyError>;
}

/// Build the notifier selected by configuration.
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, AppError> {
    match config.provider {
        NotifierProvider::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierProvider::Http => Ok(Arc::new(HttpNotifier::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_provider_requires_endpoint() {
        let config = NotifierConfig {
            provider: NotifierProvider::Http,
            ..NotifierConfig::default()
        };
        assert!(build_notifier(&config).is_err());
    }

    #[test]
    fn test_log_provider_is_default() {
        assert!(build_notifier(&NotifierConfig::default()).is_ok());
    }
}

//! Notifier that only logs. Used in development.

use async_trait::async_trait;
use tracing::info;

use super::{Notifier, NotifyError, ReminderMessage};

/// Writes each reminder to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<(), NotifyError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            idempotency_key = %message.idempotency_key,
            "Reminder delivered to log"
        );
        Ok(())
    }
}

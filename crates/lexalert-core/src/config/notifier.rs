//! Outbound notification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which notifier implementation delivers reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierProvider {
    /// Write reminders to the log only (development).
    Log,
    /// POST reminders to an HTTP email provider.
    Http,
}

/// Email provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Selected provider.
    #[serde(default = "default_provider")]
    pub provider: NotifierProvider,
    /// Provider send endpoint (required for `http`).
    #[serde(default)]
    pub endpoint: String,
    /// Bearer API key sent to the provider.
    #[serde(default)]
    pub api_key: String,
    /// Sender address placed in the `from` field.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Upper bound for one send; exceeding it counts as a transient failure.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,
}

impl NotifierConfig {
    /// Send timeout as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: String::new(),
            api_key: String::new(),
            from_address: default_from(),
            send_timeout_seconds: default_send_timeout(),
        }
    }
}

fn default_provider() -> NotifierProvider {
    NotifierProvider::Log
}

fn default_from() -> String {
    "alerts@lexalert.local".to_string()
}

fn default_send_timeout() -> u64 {
    10
}

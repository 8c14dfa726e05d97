//! Alert priority enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use lexalert_core::AppError;

/// How urgent an alert is.
///
/// `URGENT` is accepted on input as an alias of `CRITICAL`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "alert_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    /// Low priority.
    Low,
    /// Medium priority (default).
    #[default]
    Medium,
    /// High priority.
    High,
    /// Critical priority.
    #[serde(alias = "URGENT")]
    Critical,
}

impl AlertPriority {
    /// Return the priority as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" | "URGENT" => Ok(Self::Critical),
            _ => Err(AppError::validation(format!(
                "Invalid alert priority: '{s}'. Expected one of: LOW, MEDIUM, HIGH, CRITICAL"
            ))),
        }
    }
}

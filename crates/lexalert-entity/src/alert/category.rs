//! Alert category enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use lexalert_core::AppError;

/// What kind of legal obligation an alert tracks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "alert_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    /// A generic legal deadline.
    Deadline,
    /// A compliance check coming due.
    Compliance,
    /// A document reaching its expiry date.
    DocumentExpiry,
    /// A court or regulatory filing deadline.
    FilingDeadline,
    /// General notice.
    #[default]
    General,
    /// Anything else.
    Other,
}

impl AlertCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Deadline,
        Self::Compliance,
        Self::DocumentExpiry,
        Self::FilingDeadline,
        Self::General,
        Self::Other,
    ];

    /// Return the category as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deadline => "DEADLINE",
            Self::Compliance => "COMPLIANCE",
            Self::DocumentExpiry => "DOCUMENT_EXPIRY",
            Self::FilingDeadline => "FILING_DEADLINE",
            Self::General => "GENERAL",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| AppError::validation(format!("Invalid alert category: '{s}'")))
    }
}

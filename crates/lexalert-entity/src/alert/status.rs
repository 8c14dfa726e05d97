//! Alert status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use lexalert_core::AppError;

/// Lifecycle status of an alert.
///
/// ```text
/// PENDING --acknowledge--> ACKNOWLEDGED
/// PENDING | ACKNOWLEDGED --resolve--> [RESOLVED]
/// PENDING | ACKNOWLEDGED --dismiss--> [DISMISSED]
/// PENDING | ACKNOWLEDGED --due date passed--> [EXPIRED]
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "alert_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    /// Newly created, awaiting action.
    #[default]
    Pending,
    /// Seen by the owner but not yet resolved.
    Acknowledged,
    /// Handled by the owner.
    Resolved,
    /// The due date passed before the owner resolved it.
    Expired,
    /// Dismissed by the owner without resolution.
    Dismissed,
}

impl AlertStatus {
    /// Statuses from which an alert can still move.
    pub const OPEN: [Self; 2] = [Self::Pending, Self::Acknowledged];

    /// Whether no further transition is defined from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Expired | Self::Dismissed)
    }

    /// Whether `next` is reachable from this status in one step.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::Acknowledged => next.is_terminal(),
            Self::Resolved | Self::Expired | Self::Dismissed => false,
        }
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Acknowledged => "ACKNOWLEDGED",
            Self::Resolved => "RESOLVED",
            Self::Expired => "EXPIRED",
            Self::Dismissed => "DISMISSED",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACKNOWLEDGED" => Ok(Self::Acknowledged),
            "RESOLVED" => Ok(Self::Resolved),
            "EXPIRED" => Ok(Self::Expired),
            "DISMISSED" => Ok(Self::Dismissed),
            _ => Err(AppError::validation(format!("Invalid alert status: '{s}'"))),
        }
    }
}

/// A named move through the status state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTransition {
    /// Owner has seen the alert.
    Acknowledge,
    /// Owner has handled the alert.
    Resolve,
    /// Owner has dismissed the alert.
    Dismiss,
    /// The reminder worker observed the due date passing.
    Expire,
}

impl AlertTransition {
    /// The status the alert ends up in.
    pub fn target(&self) -> AlertStatus {
        match self {
            Self::Acknowledge => AlertStatus::Acknowledged,
            Self::Resolve => AlertStatus::Resolved,
            Self::Dismiss => AlertStatus::Dismissed,
            Self::Expire => AlertStatus::Expired,
        }
    }

    /// Statuses the alert must currently be in for the transition to apply.
    ///
    /// Stores use this as the guard of a conditional update.
    pub fn eligible_from(&self) -> &'static [AlertStatus] {
        match self {
            Self::Acknowledge => &[AlertStatus::Pending],
            Self::Resolve | Self::Dismiss | Self::Expire => &AlertStatus::OPEN,
        }
    }

    /// Whether the transition stamps `resolved_at`.
    pub fn closes(&self) -> bool {
        self.target().is_terminal()
    }
}

impl fmt::Display for AlertTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acknowledge => "acknowledge",
            Self::Resolve => "resolve",
            Self::Dismiss => "dismiss",
            Self::Expire => "expire",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [AlertStatus::Resolved, AlertStatus::Expired, AlertStatus::Dismissed] {
            assert!(terminal.is_terminal());
            for next in [
                AlertStatus::Pending,
                AlertStatus::Acknowledged,
                AlertStatus::Resolved,
                AlertStatus::Expired,
                AlertStatus::Dismissed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_acknowledged_only_moves_forward() {
        assert!(!AlertStatus::Acknowledged.can_transition_to(AlertStatus::Pending));
        assert!(!AlertStatus::Acknowledged.can_transition_to(AlertStatus::Acknowledged));
        assert!(AlertStatus::Acknowledged.can_transition_to(AlertStatus::Expired));
    }

    #[test]
    fn test_transition_guards_match_state_machine() {
        for transition in [
            AlertTransition::Acknowledge,
            AlertTransition::Resolve,
            AlertTransition::Dismiss,
            AlertTransition::Expire,
        ] {
            for from in transition.eligible_from() {
                assert!(from.can_transition_to(transition.target()));
            }
        }
        assert!(!AlertTransition::Acknowledge.closes());
        assert!(AlertTransition::Expire.closes());
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&AlertStatus::Acknowledged).unwrap(),
            "\"ACKNOWLEDGED\""
        );
        assert_eq!("expired".parse::<AlertStatus>().unwrap(), AlertStatus::Expired);
        assert!("OPEN".parse::<AlertStatus>().is_err());
    }
}

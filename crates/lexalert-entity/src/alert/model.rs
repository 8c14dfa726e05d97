//! Alert entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::AlertCategory;
use super::priority::AlertPriority;
use super::status::AlertStatus;

/// A legal alert owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Short headline.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Kind of obligation tracked.
    pub category: AlertCategory,
    /// Urgency.
    pub priority: AlertPriority,
    /// Lifecycle status.
    pub status: AlertStatus,
    /// When the obligation falls due.
    pub due_date: Option<DateTime<Utc>>,
    /// When the alert entered a terminal status.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who closed the alert. Empty when the worker expired it.
    pub resolved_by: Option<Uuid>,
    /// Free-form client metadata.
    pub metadata: serde_json::Value,
    /// The job that last delivered a reminder.
    pub reminder_job_id: Option<Uuid>,
    /// When that reminder was delivered.
    pub reminder_sent_at: Option<DateTime<Utc>>,
    /// When the alert was created.
    pub created_at: DateTime<Utc>,
    /// When the alert was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Check if the alert has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the alert has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the due date is at or before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due <= now)
    }

    /// Whether the alert should have a reminder job at all.
    pub fn in_reminder_pipeline(&self) -> bool {
        self.due_date.is_some() && !self.is_terminal() && !self.is_deleted()
    }

    /// Whether `job_id` already delivered a reminder for this alert.
    pub fn reminder_sent_by(&self, job_id: Uuid) -> bool {
        self.reminder_job_id == Some(job_id) && self.reminder_sent_at.is_some()
    }
}

/// Data required to create a new alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlert {
    /// The owning user.
    pub owner_id: Uuid,
    /// Trimmed title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category.
    pub category: AlertCategory,
    /// Priority.
    pub priority: AlertPriority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Client metadata.
    pub metadata: serde_json::Value,
}

/// Partial update of an alert's descriptive fields.
///
/// `due_date` distinguishes "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAlert {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<AlertCategory>,
    /// New priority.
    pub priority: Option<AlertPriority>,
    /// New due date, or `Some(None)` to clear it.
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Replacement metadata.
    pub metadata: Option<serde_json::Value>,
}

impl UpdateAlert {
    /// Whether applying this patch changes `current` due date.
    pub fn changes_due_date(&self, current: Option<DateTime<Utc>>) -> bool {
        matches!(self.due_date, Some(next) if next != current)
    }

    /// Whether the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.metadata.is_none()
    }

    /// Apply the patch to an in-memory alert.
    ///
    /// Clears the reminder record when the due date moves. Returns whether
    /// the due date changed.
    pub fn apply_to(&self, alert: &mut Alert, now: DateTime<Utc>) -> bool {
        let due_changed = self.changes_due_date(alert.due_date);
        if let Some(title) = &self.title {
            alert.title = title.clone();
        }
        if let Some(description) = &self.description {
            alert.description = description.clone();
        }
        if let Some(category) = self.category {
            alert.category = category;
        }
        if let Some(priority) = self.priority {
            alert.priority = priority;
        }
        if let Some(metadata) = &self.metadata {
            alert.metadata = metadata.clone();
        }
        if let Some(due_date) = self.due_date {
            alert.due_date = due_date;
        }
        if due_changed {
            alert.reminder_job_id = None;
            alert.reminder_sent_at = None;
        }
        alert.updated_at = now;
        due_changed
    }
}

/// Filters for listing an owner's alerts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertFilter {
    /// Only alerts in this status.
    pub status: Option<AlertStatus>,
    /// Only alerts in this category.
    pub category: Option<AlertCategory>,
    /// Only alerts with this priority.
    pub priority: Option<AlertPriority>,
}

impl AlertFilter {
    /// Check whether an alert passes the filter.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.status.is_none_or(|s| alert.status == s)
            && self.category.is_none_or(|c| alert.category == c)
            && self.priority.is_none_or(|p| alert.priority == p)
    }
}

/// Deserialize a present-but-null field as `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use lexalert_core::types::pagination::PageRequest;
use lexalert_entity::alert::{AlertCategory, AlertFilter, AlertPriority, AlertStatus};
use lexalert_entity::job::JobStatus;
use lexalert_service::CreateAlertRequest;

/// Default items per page.
const DEFAULT_PER_PAGE: u64 = 25;

/// Create alert request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAlertBody {
    /// Title. The 255-character limit applies after trimming, in the service.
    #[validate(length(min = 1))]
    pub title: String,
    /// Description.
    #[validate(length(min = 1))]
    pub description: String,
    /// Category (default `GENERAL`).
    pub category: Option<AlertCategory>,
    /// Priority (default `MEDIUM`).
    pub priority: Option<AlertPriority>,
    /// Optional due date (RFC 3339).
    pub due_date: Option<DateTime<Utc>>,
    /// Client metadata object.
    pub metadata: Option<serde_json::Value>,
}

impl From<CreateAlertBody> for CreateAlertRequest {
    fn from(body: CreateAlertBody) -> Self {
        Self {
            title: body.title,
            description: body.description,
            category: body.category,
            priority: body.priority,
            due_date: body.due_date,
            metadata: body.metadata,
        }
    }
}

/// Query string for `GET /api/alerts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertListQuery {
    /// Filter by status.
    pub status: Option<AlertStatus>,
    /// Filter by category.
    pub category: Option<AlertCategory>,
    /// Filter by priority.
    pub priority: Option<AlertPriority>,
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (max 100).
    pub per_page: Option<u64>,
}

impl AlertListQuery {
    /// The filter part of the query.
    pub fn filter(&self) -> AlertFilter {
        AlertFilter {
            status: self.status,
            category: self.category,
            priority: self.priority,
        }
    }

    /// The pagination part of the query.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

/// Query string for `GET /api/admin/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListQuery {
    /// Filter by status.
    pub status: Option<JobStatus>,
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page (max 100).
    pub per_page: Option<u64>,
}

impl JobListQuery {
    /// The pagination part of the query.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

//! In-memory alert store.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::alert::{
    Alert, AlertFilter, AlertStatus, AlertTransition, CreateAlert, UpdateAlert,
};

use crate::traits::AlertStore;

/// [`AlertStore`] over a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertStore {
    alerts: Arc<DashMap<Uuid, Alert>>,
}

impl MemoryAlertStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a row including soft-deleted ones.
    pub fn raw(&self, id: Uuid) -> Option<Alert> {
        self.alerts.get(&id).map(|a| a.clone())
    }
}

/// Due date ascending with undated alerts last, then creation time.
fn listing_order(a: &Alert, b: &Alert) -> Ordering {
    let by_due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due.then(a.created_at.cmp(&b.created_at))
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn create(&self, data: &CreateAlert) -> AppResult<Alert> {
        let now = Utc::now();
        let alert = Alert {
            id: Uuid::now_v7(),
            owner_id: data.owner_id,
            title: data.title.clone(),
            description: data.description.clone(),
            category: data.category,
            priority: data.priority,
            status: AlertStatus::Pending,
            due_date: data.due_date,
            resolved_at: None,
            resolved_by: None,
            metadata: data.metadata.clone(),
            reminder_job_id: None,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Alert>> {
        Ok(self
            .alerts
            .get(&id)
            .filter(|a| !a.is_deleted())
            .map(|a| a.clone()))
    }

    async fn find_for_owner(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>> {
        Ok(self
            .find_by_id(id)
            .await?
            .filter(|a| a.owner_id == owner_id))
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        filter: &AlertFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| a.owner_id == owner_id && !a.is_deleted() && filter.matches(a))
            .map(|a| a.clone())
            .collect();
        alerts.sort_by(listing_order);
        Ok(PageResponse::from_sorted(alerts, page))
    }

    async fn update_details(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateAlert,
    ) -> AppResult<Option<Alert>> {
        let Some(mut alert) = self.alerts.get_mut(&id) else {
            return Ok(None);
        };
        if alert.owner_id != owner_id || alert.is_deleted() {
            return Ok(None);
        }
        patch.apply_to(&mut alert, Utc::now());
        Ok(Some(alert.clone()))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        transition: AlertTransition,
        actor: Option<Uuid>,
    ) -> AppResult<Option<Alert>> {
        let Some(mut alert) = self.alerts.get_mut(&id) else {
            return Ok(None);
        };
        let owned = owner_id.is_none_or(|owner| alert.owner_id == owner);
        if !owned || alert.is_deleted() || !transition.eligible_from().contains(&alert.status) {
            return Ok(None);
        }

        let now = Utc::now();
        alert.status = transition.target();
        if transition.closes() {
            alert.resolved_at = Some(now);
            alert.resolved_by = actor;
        }
        alert.updated_at = now;
        Ok(Some(alert.clone()))
    }

    async fn record_reminder_sent(
        &self,
        id: Uuid,
        job_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut alert) = self.alerts.get_mut(&id) else {
            return Ok(false);
        };
        if alert.is_deleted() {
            return Ok(false);
        }
        alert.reminder_job_id = Some(job_id);
        alert.reminder_sent_at = Some(sent_at);
        alert.updated_at = Utc::now();
        Ok(true)
    }

    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>> {
        let Some(mut alert) = self.alerts.get_mut(&id) else {
            return Ok(None);
        };
        if alert.owner_id != owner_id || alert.is_deleted() {
            return Ok(None);
        }
        let now = Utc::now();
        alert.deleted_at = Some(now);
        alert.updated_at = now;
        Ok(Some(alert.clone()))
    }

    async fn find_awaiting_reminder(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> AppResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| {
                a.in_reminder_pipeline()
                    && a.reminder_sent_at.is_none()
                    && after.is_none_or(|cursor| a.id > cursor)
            })
            .map(|a| a.clone())
            .collect();
        alerts.sort_by_key(|a| a.id);
        alerts.truncate(limit as usize);
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lexalert_entity::alert::{AlertCategory, AlertPriority};

    fn input(owner_id: Uuid, title: &str, due_in_days: Option<i64>) -> CreateAlert {
        CreateAlert {
            owner_id,
            title: title.into(),
            description: "details".into(),
            category: AlertCategory::Deadline,
            priority: AlertPriority::Medium,
            due_date: due_in_days.map(|d| Utc::now() + Duration::days(d)),
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_due_date_nulls_last() {
        let store = MemoryAlertStore::new();
        let owner = Uuid::new_v4();
        store.create(&input(owner, "undated", None)).await.unwrap();
        store.create(&input(owner, "later", Some(10))).await.unwrap();
        store.create(&input(owner, "sooner", Some(1))).await.unwrap();
        store.create(&input(Uuid::new_v4(), "foreign", Some(2))).await.unwrap();

        let page = store
            .list_for_owner(owner, &AlertFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        let titles: Vec<&str> = page.items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);
        assert_eq!(page.total_items, 3);
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = MemoryAlertStore::new();
        let owner = Uuid::new_v4();
        let alert = store.create(&input(owner, "a", Some(1))).await.unwrap();

        let resolved = store
            .transition_status(alert.id, Some(owner), AlertTransition::Resolve, Some(owner))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by, Some(owner));
        assert!(resolved.resolved_at.is_some());

        let expired = store
            .transition_status(alert.id, None, AlertTransition::Expire, None)
            .await
            .unwrap();
        assert!(expired.is_none());
        assert_eq!(
            store.find_by_id(alert.id).await.unwrap().unwrap().status,
            AlertStatus::Resolved
        );
    }

    #[tokio::test]
    async fn test_transition_scoped_by_owner() {
        let store = MemoryAlertStore::new();
        let alert = store.create(&input(Uuid::new_v4(), "a", None)).await.unwrap();
        let stranger = Uuid::new_v4();
        let result = store
            .transition_status(alert.id, Some(stranger), AlertTransition::Acknowledge, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_alert() {
        let store = MemoryAlertStore::new();
        let owner = Uuid::new_v4();
        let alert = store.create(&input(owner, "a", Some(1))).await.unwrap();

        assert!(store.soft_delete(alert.id, owner).await.unwrap().is_some());
        assert!(store.find_by_id(alert.id).await.unwrap().is_none());
        assert!(store.soft_delete(alert.id, owner).await.unwrap().is_none());
        assert!(store.raw(alert.id).unwrap().deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_awaiting_reminder_excludes_sent_and_undated() {
        let store = MemoryAlertStore::new();
        let owner = Uuid::new_v4();
        let waiting = store.create(&input(owner, "waiting", Some(1))).await.unwrap();
        let sent = store.create(&input(owner, "sent", Some(1))).await.unwrap();
        store.create(&input(owner, "undated", None)).await.unwrap();
        store
            .record_reminder_sent(sent.id, Uuid::new_v4(), Utc::now())
            .await
            .unwrap();

        let found = store.find_awaiting_reminder(None, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, waiting.id);

        let after = store.find_awaiting_reminder(Some(waiting.id), 10).await.unwrap();
        assert!(after.is_empty());
    }
}

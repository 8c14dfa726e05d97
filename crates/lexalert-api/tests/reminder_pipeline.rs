//! End-to-end reminder delivery: API writes, the worker drains the queue.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use helpers::TestApp;
use lexalert_database::AlertStore;
use lexalert_entity::alert::{AlertStatus, AlertTransition};
use lexalert_entity::job::{JobStatus, queues};
use lexalert_entity::user::UserRole;
use lexalert_worker::JobOutcome;

#[tokio::test]
async fn test_reminder_fires_a_lead_ahead_and_alert_stays_pending() {
    let app = TestApp::new();
    let (owner, token) = app.user(UserRole::Lawyer);
    let now = Utc::now();
    let id = app.create_alert(&token, Some(now + Duration::days(2))).await;

    assert!(app.drain(now + Duration::hours(12)).await.is_empty());
    assert_eq!(app.notifier.sent_count(), 0);

    let outcomes = app.drain(now + Duration::days(1) + Duration::minutes(1)).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1, JobOutcome::Completed);

    let sent = app.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, format!("{owner}@firm.test"));
    assert_eq!(sent[0].idempotency_key, outcomes[0].0);

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "PENDING");
    assert!(!alert.data()["reminder_sent_at"].is_null());
}

#[tokio::test]
async fn test_overdue_alert_is_reminded_then_expired() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() - Duration::hours(1)))
        .await;

    let outcomes = app.drain(Utc::now() + Duration::seconds(1)).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(app.notifier.sent_count(), 1);

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "EXPIRED");
    assert!(alert.data()["resolved_by"].is_null());
    assert!(!alert.data()["resolved_at"].is_null());
}

#[tokio::test]
async fn test_acknowledged_alert_is_reminded_once() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let now = Utc::now();
    let id = app.create_alert(&token, Some(now + Duration::days(2))).await;

    let acked = app
        .post(&format!("/api/alerts/{id}/acknowledge"), &token, None)
        .await;
    assert_eq!(acked.data()["status"], "ACKNOWLEDGED");

    let later = now + Duration::days(1) + Duration::minutes(1);
    assert_eq!(app.drain(later).await.len(), 1);
    assert_eq!(app.notifier.sent_count(), 1);

    // Nothing left to deliver, and the sweep does not schedule another one.
    assert!(app.drain(later + Duration::days(2)).await.is_empty());
    let (_, admin) = app.user(UserRole::Admin);
    let report = app
        .post("/api/admin/reminders/reconcile", &admin, None)
        .await;
    assert_eq!(report.data()["scheduled"], 0);
    assert_eq!(app.notifier.sent_count(), 1);

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "ACKNOWLEDGED");
}

#[tokio::test]
async fn test_redelivered_job_does_not_send_twice() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() - Duration::minutes(5)))
        .await;

    // A first worker leases the job, sends, records it, then dies before
    // completing.
    let queue_names = vec![queues::REMINDERS.to_string()];
    let leased = app.queue.dequeue(&queue_names).await.unwrap().unwrap();
    app.alerts
        .record_reminder_sent(id, leased.id, Utc::now())
        .await
        .unwrap();

    let outcomes = app.drain(Utc::now() + Duration::minutes(10)).await;
    assert_eq!(outcomes, vec![(leased.id, JobOutcome::Completed)]);
    assert_eq!(app.notifier.sent_count(), 0);

    let job = app.queue.find(leased.id).await.unwrap();
    assert_eq!(job.attempts, 2);
    assert_eq!(job.result.as_ref().unwrap()["already_sent"], true);

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "EXPIRED");
}

#[tokio::test]
async fn test_resolved_alert_is_never_reminded() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let now = Utc::now();
    let id = app.create_alert(&token, Some(now + Duration::days(2))).await;

    let resolved = app
        .post(&format!("/api/alerts/{id}/resolve"), &token, None)
        .await;
    assert_eq!(resolved.status, StatusCode::OK);

    assert!(app.drain(now + Duration::days(3)).await.is_empty());
    assert_eq!(app.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_worker_skips_alert_closed_behind_its_back() {
    let app = TestApp::new();
    let (owner, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() - Duration::hours(1)))
        .await;

    // Closed without going through the service, so the job survives.
    app.alerts
        .transition_status(id, Some(owner), AlertTransition::Dismiss, Some(owner))
        .await
        .unwrap()
        .unwrap();

    let outcomes = app.drain(Utc::now() + Duration::seconds(1)).await;
    assert_eq!(outcomes[0].1, JobOutcome::Completed);
    assert_eq!(app.notifier.sent_count(), 0);

    let job = app.queue.find(outcomes[0].0).await.unwrap();
    assert_eq!(job.result.as_ref().unwrap()["skipped"], "alert_closed");
    let alert = app.alerts.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(alert.status, AlertStatus::Dismissed);
}

#[tokio::test]
async fn test_transient_failures_recover_and_expire() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() - Duration::hours(1)))
        .await;
    app.notifier.fail_next(2);

    let outcomes = app.drain(Utc::now() + Duration::days(1)).await;
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0].1, JobOutcome::Rescheduled { .. }));
    assert_eq!(outcomes[2].1, JobOutcome::Completed);
    assert_eq!(app.notifier.sent_count(), 1);

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "EXPIRED");
}

#[tokio::test]
async fn test_exhausted_retries_dead_letter_and_leave_alert_unchanged() {
    let app = TestApp::with_max_attempts(3);
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() - Duration::hours(1)))
        .await;
    app.notifier.fail_next(10);

    let outcomes = app.drain(Utc::now() + Duration::days(1)).await;
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[2].1, JobOutcome::DeadLettered);
    assert_eq!(app.notifier.sent_count(), 0);

    let job = app.queue.find(outcomes[0].0).await.unwrap();
    assert_eq!(job.status, JobStatus::Dead);
    assert!(job.error_message.is_some());

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.data()["status"], "PENDING");
    assert!(alert.data()["reminder_sent_at"].is_null());
}

//! Alert endpoints: authentication, validation, ownership and transitions.

mod helpers;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use helpers::{TestApp, token_for};
use lexalert_entity::job::JobStatus;
use lexalert_entity::user::UserRole;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "memory");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/api/alerts", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");

    let forged = token_for(Uuid::new_v4(), UserRole::Lawyer, "wrong-secret", 600);
    let response = app.get("/api/alerts", &forged).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_schedules_reminder() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let due = Utc::now() + Duration::days(3);

    let id = app.create_alert(&token, Some(due)).await;

    let alert = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(alert.status, StatusCode::OK);
    assert_eq!(alert.data()["status"], "PENDING");
    assert_eq!(alert.data()["category"], "FILING_DEADLINE");

    let jobs = app.jobs.all().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Pending);
    let lead = Duration::seconds(app.config.reminder.lead_interval_seconds as i64);
    let expected = due - lead;
    assert!((jobs[0].scheduled_at - expected).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);

    let response = app
        .post(
            "/api/alerts",
            &token,
            Some(json!({"title": "", "description": "Missing title"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let response = app
        .post(
            "/api/alerts",
            &token,
            Some(json!({"title": "   ", "description": "Whitespace title"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/alerts",
            &token,
            Some(json!({"title": "Renew license", "description": "x", "metadata": [1, 2]})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/alerts",
            &token,
            Some(json!({"title": "b".repeat(256), "description": "Too long"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert!(app.jobs.all().await.is_empty());
}

#[tokio::test]
async fn test_title_limit_applies_after_trim() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let title = "a".repeat(255);

    let response = app
        .post(
            "/api/alerts",
            &token,
            Some(json!({"title": format!("   {title}   "), "description": "Padded"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["title"], title);
}

#[tokio::test]
async fn test_alerts_are_owner_scoped() {
    let app = TestApp::new();
    let (_, owner) = app.user(UserRole::Lawyer);
    let (_, other) = app.user(UserRole::Lawyer);
    let id = app.create_alert(&owner, None).await;

    let response = app.get(&format!("/api/alerts/{id}"), &other).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post(&format!("/api/alerts/{id}/resolve"), &other, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let listed = app.get("/api/alerts", &other).await;
    assert_eq!(listed.data()["total_items"], 0);
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Client);
    for days in 1..=3 {
        app.create_alert(&token, Some(Utc::now() + Duration::days(days)))
            .await;
    }
    let undated = app.create_alert(&token, None).await;
    app.post(&format!("/api/alerts/{undated}/dismiss"), &token, None)
        .await;

    let page = app.get("/api/alerts?per_page=2&page=1", &token).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.data()["items"].as_array().unwrap().len(), 2);
    assert_eq!(page.data()["total_items"], 4);
    assert_eq!(page.data()["has_next"], true);

    let dismissed = app.get("/api/alerts?status=DISMISSED", &token).await;
    assert_eq!(dismissed.data()["total_items"], 1);
    assert_eq!(dismissed.data()["items"][0]["id"], undated.to_string());

    let bad = app.get("/api/alerts?status=ARCHIVED", &token).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_due_date_reschedules_and_clearing_cancels() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() + Duration::days(4)))
        .await;

    let new_due = Utc::now() + Duration::days(10);
    let response = app
        .put(
            &format!("/api/alerts/{id}"),
            &token,
            json!({"due_date": new_due, "priority": "CRITICAL"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["priority"], "CRITICAL");

    let jobs = app.jobs.all().await;
    let pending: Vec<_> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Pending)
        .collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(jobs.len(), 2);

    let response = app
        .put(&format!("/api/alerts/{id}"), &token, json!({"due_date": null}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.data()["due_date"].is_null());
    assert!(
        app.jobs
            .all()
            .await
            .iter()
            .all(|j| j.status != JobStatus::Pending)
    );
}

#[tokio::test]
async fn test_transitions_and_idempotent_close() {
    let app = TestApp::new();
    let (user_id, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() + Duration::days(2)))
        .await;

    let acked = app
        .post(&format!("/api/alerts/{id}/acknowledge"), &token, None)
        .await;
    assert_eq!(acked.data()["status"], "ACKNOWLEDGED");
    // Acknowledging keeps the reminder.
    assert_eq!(
        app.jobs
            .all()
            .await
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count(),
        1
    );

    let resolved = app
        .post(&format!("/api/alerts/{id}/resolve"), &token, None)
        .await;
    assert_eq!(resolved.status, StatusCode::OK);
    assert_eq!(resolved.data()["status"], "RESOLVED");
    assert_eq!(resolved.data()["resolved_by"], user_id.to_string());
    assert!(!resolved.data()["resolved_at"].is_null());
    assert!(
        app.jobs
            .all()
            .await
            .iter()
            .all(|j| j.status == JobStatus::Cancelled)
    );

    // A second close is a no-op that returns the alert as it is.
    let again = app
        .post(&format!("/api/alerts/{id}/dismiss"), &token, None)
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.data()["status"], "RESOLVED");
}

#[tokio::test]
async fn test_delete_hides_alert_and_cancels_reminder() {
    let app = TestApp::new();
    let (_, token) = app.user(UserRole::Lawyer);
    let id = app
        .create_alert(&token, Some(Utc::now() + Duration::days(2)))
        .await;

    let response = app.delete(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/api/alerts/{id}"), &token).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    assert_eq!(app.jobs.all().await[0].status, JobStatus::Cancelled);
}

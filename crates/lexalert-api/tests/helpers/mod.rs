//! Shared harness for API tests: the full router over in-memory stores.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use lexalert_api::{AppState, Claims, build_app};
use lexalert_core::config::AppConfig;
use lexalert_database::memory::{MemoryAlertStore, MemoryJobStore, MemoryUserDirectory};
use lexalert_entity::user::{User, UserRole, UserStatus};
use lexalert_service::{Services, Stores};
use lexalert_worker::notifier::{Notifier, NotifyError, ReminderMessage};
use lexalert_worker::{JobOutcome, JobQueue, WorkerRunner};

const SECRET: &str = "api-test-secret";

/// Records sends; fails transiently while `failures_left` is positive.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<ReminderMessage>>,
    pub failures_left: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn fail_next(&self, times: u32) {
        *self.failures_left.lock().unwrap() = times;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<(), NotifyError> {
        {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(NotifyError::Transient("provider unavailable".into()));
            }
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub struct TestApp {
    pub router: Router,
    pub alerts: Arc<MemoryAlertStore>,
    pub jobs: Arc<MemoryJobStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub queue: Arc<JobQueue>,
    pub notifier: Arc<RecordingNotifier>,
    pub runner: WorkerRunner,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_max_attempts(5)
    }

    pub fn with_max_attempts(max_attempts: i32) -> Self {
        let config = AppConfig::from_toml(&format!(
            r#"
            [database]
            url = "postgres://unused"

            [auth]
            jwt_secret = "{SECRET}"

            [worker.retry]
            max_attempts = {max_attempts}
            base_delay_seconds = 30
            max_delay_seconds = 600
            "#
        ))
        .expect("test config");

        let alerts = Arc::new(MemoryAlertStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let stores = Stores {
            alerts: alerts.clone(),
            users: users.clone(),
            jobs: jobs.clone(),
        };
        let services = Services::build(&config, stores, notifier.clone(), "api-test");
        let runner = services.runner(&config);

        let state = AppState::new(
            Arc::new(config.clone()),
            Arc::clone(&services.alerts),
            Arc::clone(&services.job_admin),
            None,
        );

        Self {
            router: build_app(state),
            alerts,
            jobs,
            users,
            queue: Arc::clone(&services.queue),
            notifier,
            runner,
            config,
        }
    }

    /// Register a user in the directory and return a bearer token for them.
    pub fn user(&self, role: UserRole) -> (Uuid, String) {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.users.insert(User {
            id,
            email: format!("{id}@firm.test"),
            name: "Test Counsel".into(),
            role,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        (id, token_for(id, role, SECRET, 3600))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Option<Value>) -> TestResponse {
        self.request(Method::POST, uri, Some(token), body).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Create an alert through the API and return its id.
    pub async fn create_alert(&self, token: &str, due_date: Option<DateTime<Utc>>) -> Uuid {
        let response = self
            .post(
                "/api/alerts",
                token,
                Some(serde_json::json!({
                    "title": "File opposition brief",
                    "description": "Opposition due to the district court",
                    "category": "FILING_DEADLINE",
                    "priority": "HIGH",
                    "due_date": due_date,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.data()["id"].as_str().unwrap().parse().unwrap()
    }

    /// Run every job deliverable at `now`.
    pub async fn drain(&self, now: DateTime<Utc>) -> Vec<(Uuid, JobOutcome)> {
        self.runner.drain(now).await.unwrap()
    }
}

pub fn token_for(sub: Uuid, role: UserRole, secret: &str, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub,
        role,
        exp: now + ttl_seconds,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

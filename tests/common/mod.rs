//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use account_ledger::api::{self, AppState};
use account_ledger::handlers::AccountService;
use account_ledger::notification::NotificationService;
use account_ledger::{Account, AccountStore, CommitPolicy};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::util::ServiceExt;

/// Notification service that remembers every notice
#[derive(Debug, Default)]
pub struct RecordingNotifications {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifications {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

impl NotificationService for RecordingNotifications {
    fn notify_about_transfer(&self, account: &Account, transfer_description: &str) {
        self.sent
            .lock()
            .push((account.account_id().to_string(), transfer_description.to_string()));
    }
}

/// Test application with an empty store
pub struct TestApp {
    pub router: Router,
    pub accounts: AccountService,
    pub notifications: Arc<RecordingNotifications>,
}

pub fn setup_app() -> TestApp {
    let accounts = AccountService::new(Arc::new(AccountStore::new()))
        .with_policy(CommitPolicy::LastWriterWins);
    let notifications = Arc::new(RecordingNotifications::default());
    let state = AppState::new(accounts.clone(), notifications.clone());

    TestApp {
        router: api::build_router(state),
        accounts,
        notifications,
    }
}

impl TestApp {
    /// Send one request and return status, `x-request-id` and body text
    pub async fn send(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Option<String>, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        (status, request_id, String::from_utf8(bytes.to_vec()).unwrap())
    }
}

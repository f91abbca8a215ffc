//! Common test utilities and fixtures

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use worklog_core::{Role, User};
use worklog_server::{services::AuthService, state::AppState};
use worklog_storage::Database;

pub const TEST_SECRET: &str = "test-secret-key";
pub const TEST_PASSWORD: &str = "password";

/// A router over a fresh temp-file database
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
        let db = Database::new(&db_url).await.unwrap();

        let auth_service = Arc::new(AuthService::new(TEST_SECRET, 30));
        let state = AppState::new(db, auth_service);
        let router = worklog_server::router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Insert a user directly and return it with a valid token
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> (User, String) {
        let mut user = User::new();
        user.set_name(name).unwrap();
        user.set_email(email).unwrap();
        user.set_password(TEST_PASSWORD).unwrap();
        user.set_role(role);

        let user = self.state.users.add(&user).await.unwrap();
        let token = self.state.auth_service.issue_token(user.id()).unwrap();
        (user, token)
    }

    /// Send one request and return the status and the parsed JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}

/// The tag of an error response
pub fn error_tag(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

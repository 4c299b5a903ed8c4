//! Common test utilities for HTTP integration tests
//!
//! The router is built over an in-memory store, so these tests need no
//! database. Requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use workboard_api::app::{build_router, AppState};
use workboard_api::config::Config;
use workboard_shared::store::memory::InMemoryStore;

pub const TEST_SECRET: &str = "api-integration-test-secret-32-bytes!";
pub const PASSWORD: &str = "correctpass";

/// Router plus the store behind it
pub struct TestContext {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
}

/// A registered user with a live access token
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://unused/test".to_string()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(InMemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config));

        Self { app, store }
    }

    /// Sends a request and returns the status and parsed JSON body
    /// (`Value::Null` for an empty body)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        match body {
            Some(body) => {
                self.send_raw(method, uri, token, Some("application/json"), body.to_string())
                    .await
            }
            None => self.send_raw(method, uri, token, None, String::new()).await,
        }
    }

    /// Sends an arbitrary body with an optional content type
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }

        let request = builder.body(Body::from(body)).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Registers a user through the API and logs in
    pub async fn user(&self, name: &str) -> TestUser {
        let email = format!("{}@x.com", name.to_lowercase());

        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = Uuid::parse_str(body["user_id"].as_str().unwrap()).unwrap();

        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        TestUser {
            id,
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project as `owner` and returns its id
    pub async fn project(&self, owner: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/v1/projects",
                Some(&owner.token),
                Some(json!({ "name": name, "category": "Planning", "status": "Active" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn add_member(&self, admin: &TestUser, project_id: &str, user: &TestUser, role: &str) {
        let (status, body) = self
            .send(
                "POST",
                &format!("/v1/projects/{project_id}/members"),
                Some(&admin.token),
                Some(json!({ "user_id": user.id, "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add member failed: {body}");
    }
}

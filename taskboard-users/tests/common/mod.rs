//! Common test utilities for the identity service router tests
//!
//! The router runs against an in-memory store, so these tests need no
//! database. Requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskboard_shared::auth::jwt::{SigningKey, TokenKeys};
use taskboard_shared::config::HttpConfig;
use taskboard_shared::store::memory::MemoryUserStore;
use taskboard_users::app::{build_router, AppState};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_keys() -> TokenKeys {
    TokenKeys::new(SigningKey::new("v1", TEST_SECRET))
}

/// Test context containing the router and its store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryUserStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::new(
            store.clone(),
            test_keys(),
            HttpConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
        );

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    /// Registers an identity and returns `(id, token)`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/api/users/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}

//! Common test utilities for the task service router tests
//!
//! The router runs against an in-memory task store and a [`StaticDirectory`]
//! standing in for the identity service. Tokens are minted with the same
//! key the router verifies with, as the identity service would.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use taskboard_shared::auth::jwt::{SigningKey, TokenKeys};
use taskboard_shared::config::HttpConfig;
use taskboard_shared::models::user::{PublicUser, Role};
use taskboard_shared::store::memory::MemoryTaskStore;
use taskboard_tasks::app::{build_router, AppState};
use taskboard_tasks::directory::StaticDirectory;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_keys() -> TokenKeys {
    TokenKeys::new(SigningKey::new("v1", TEST_SECRET))
}

pub fn test_http() -> HttpConfig {
    HttpConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
    }
}

/// An identity known to the directory, with a token for it
pub struct Caller {
    pub id: Uuid,
    pub token: String,
}

/// Test context containing the router, its store and the directory
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryTaskStore>,
    pub directory: Arc<StaticDirectory>,
    keys: TokenKeys,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryTaskStore::new());
        let directory = Arc::new(StaticDirectory::new());
        let state = AppState::new(store.clone(), directory.clone(), test_keys(), test_http());

        Self {
            app: build_router(state),
            store,
            directory,
            keys: test_keys(),
        }
    }

    /// Registers an identity with the directory and mints its token
    pub fn caller(&self, name: &str, email: &str) -> Caller {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.directory.insert(PublicUser {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Member,
            created_at: now,
            updated_at: now,
        });

        Caller {
            id,
            token: self.keys.issue(id, email, Role::Member).unwrap(),
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

    /// Creates a task and returns its id
    pub async fn create_task(&self, token: &str, body: Value) -> String {
        let (status, response) = self.send("POST", "/api/tasks", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", response);
        response["task"]["id"].as_str().unwrap().to_string()
    }
}

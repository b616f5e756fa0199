/// Both services wired together over real HTTP
///
/// The identity router is served on an ephemeral port with an in-memory
/// store; the task service reaches it through [`HttpIdentityDirectory`],
/// exactly as in production.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{test_http, test_keys};
use serde_json::{json, Value};
use taskboard_shared::store::memory::{MemoryTaskStore, MemoryUserStore};
use taskboard_tasks::app::{build_router, AppState};
use taskboard_tasks::directory::HttpIdentityDirectory;
use tower::ServiceExt;

/// Serves the identity router and returns its base URL
async fn spawn_identity_service() -> String {
    let state = taskboard_users::app::AppState::new(
        Arc::new(MemoryUserStore::new()),
        test_keys(),
        test_http(),
    );
    let router = taskboard_users::app::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn post_json(url: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_register_login_then_assign_task() {
    let identity_url = spawn_identity_service().await;

    let (status, registered) = post_json(
        &format!("{}/api/users/register", identity_url),
        json!({ "name": "Alice", "email": "alice@x.com", "password": "pw123" }),
    )
    .await;
    assert_eq!(status, 201);
    let alice_id = registered["user"]["id"].as_str().unwrap().to_string();

    let (status, login) = post_json(
        &format!("{}/api/users/login", identity_url),
        json!({ "email": "alice@x.com", "password": "pw123" }),
    )
    .await;
    assert_eq!(status, 200);
    let token = login["token"].as_str().unwrap().to_string();

    let directory = HttpIdentityDirectory::new(identity_url, Duration::from_secs(5)).unwrap();
    let tasks = build_router(AppState::new(
        Arc::new(MemoryTaskStore::new()),
        Arc::new(directory),
        test_keys(),
        test_http(),
    ));

    let (status, created) = call(
        &tasks,
        "POST",
        "/api/tasks",
        &token,
        Some(json!({ "title": "A", "assignee_id": alice_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["task"]["status"], "todo");
    assert_eq!(created["task"]["priority"], "medium");
    assert_eq!(created["task"]["created_by"], alice_id);

    let task_id = created["task"]["id"].as_str().unwrap();
    let (status, detail) =
        call(&tasks, "GET", &format!("/api/tasks/{}", task_id), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["assignee"]["email"], "alice@x.com");

    let (status, rejected) = call(
        &tasks,
        "POST",
        "/api/tasks",
        &token,
        Some(json!({ "title": "B", "assignee_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected["error"], "invalid_assignee");
}

#[tokio::test]
async fn test_identity_service_down_rejects_assignment() {
    let keys = test_keys();
    let caller = uuid::Uuid::new_v4();
    let token = keys
        .issue(caller, "alice@x.com", taskboard_shared::models::user::Role::Member)
        .unwrap();

    let directory =
        HttpIdentityDirectory::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let tasks = build_router(AppState::new(
        Arc::new(MemoryTaskStore::new()),
        Arc::new(directory),
        keys,
        test_http(),
    ));

    let (status, body) = call(
        &tasks,
        "POST",
        "/api/tasks",
        &token,
        Some(json!({ "title": "A", "assignee_id": caller })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_assignee");
}

/// Application state and router builder

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use taskboard_shared::auth::{jwt::TokenKeys, middleware::jwt_auth};
use taskboard_shared::config::HttpConfig;
use taskboard_shared::http::cors::cors_layer;
use taskboard_shared::store::TaskStore;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{directory::IdentityDirectory, service::TaskService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Task operations
    pub tasks: TaskService,

    /// Token verifier; this service never issues tokens
    pub keys: Arc<TokenKeys>,

    pub http: Arc<HttpConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TaskStore>,
        directory: Arc<dyn IdentityDirectory>,
        keys: TokenKeys,
        http: HttpConfig,
    ) -> Self {
        Self {
            tasks: TaskService::new(store, directory),
            keys: Arc::new(keys),
            http: Arc::new(http),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                 # public
/// └── /api/tasks                  # bearer token on everything below
///     ├── POST   /
///     ├── GET    /
///     ├── GET    /my
///     ├── GET    /stats
///     ├── GET    /user/:userId
///     ├── GET    /:id
///     ├── PUT    /:id
///     └── DELETE /:id
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{health, tasks};

    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/my", get(tasks::my_tasks))
        .route("/stats", get(tasks::task_stats))
        .route("/user/:userId", get(tasks::user_tasks))
        .route(
            "/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .layer(middleware::from_fn_with_state(state.keys.clone(), jwt_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.http.cors_origins))
        .with_state(state)
}

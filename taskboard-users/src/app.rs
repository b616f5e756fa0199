/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::db::pool::create_pool;
/// use taskboard_shared::store::postgres::PgUserStore;
/// use taskboard_users::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(
///     Arc::new(PgUserStore::new(pool)),
///     config.jwt.token_keys(),
///     config.http.clone(),
/// );
///
/// let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use taskboard_shared::auth::{jwt::TokenKeys, middleware::jwt_auth};
use taskboard_shared::config::HttpConfig;
use taskboard_shared::http::cors::cors_layer;
use taskboard_shared::store::UserStore;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::service::IdentityService;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Identity operations
    pub identities: IdentityService,

    /// Token issuer/verifier
    pub keys: Arc<TokenKeys>,

    /// Listener and CORS settings
    pub http: Arc<HttpConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, keys: TokenKeys, http: HttpConfig) -> Self {
        let keys = Arc::new(keys);
        Self {
            identities: IdentityService::new(store, keys.clone()),
            keys,
            http: Arc::new(http),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                 # public
/// └── /api/users
///     ├── POST   /register        # public
///     ├── POST   /login           # public
///     ├── GET    /me              # bearer token
///     ├── GET    /                # bearer token
///     ├── GET    /:id             # bearer token
///     ├── PUT    /:id             # bearer token
///     └── DELETE /:id             # bearer token
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/me", get(routes::users::current_user))
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .layer(middleware::from_fn_with_state(state.keys.clone(), jwt_auth));

    let user_routes = public_routes.merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/users", user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.http.cors_origins))
        .with_state(state)
}

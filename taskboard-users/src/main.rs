//! # Taskboard Identity Service
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskboard_users \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskboard-users
//! ```

use std::sync::Arc;

use taskboard_shared::db::pool::{close_pool, create_pool};
use taskboard_shared::http::shutdown_signal;
use taskboard_shared::models::user::User;
use taskboard_shared::store::postgres::PgUserStore;
use taskboard_shared::telemetry;
use taskboard_users::{
    app::{build_router, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may set RUST_LOG / LOG_FORMAT, so load it before tracing
    dotenvy::dotenv().ok();
    telemetry::init("taskboard_users=debug,taskboard_shared=debug,tower_http=debug");

    tracing::info!(
        "Taskboard identity service v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let pool = create_pool(config.database.clone()).await?;
    User::initialize(&pool).await?;

    let state = AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        config.jwt.token_keys(),
        config.http.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Identity service stopped");
    Ok(())
}

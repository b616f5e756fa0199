//! # Taskboard Task Service
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskboard_tasks \
//! JWT_SECRET=<same secret as the identity service> \
//! USER_SERVICE_URL=http://localhost:3001 \
//! cargo run -p taskboard-tasks
//! ```

use std::sync::Arc;

use anyhow::Context;
use taskboard_shared::db::pool::{close_pool, create_pool};
use taskboard_shared::http::shutdown_signal;
use taskboard_shared::models::task::Task;
use taskboard_shared::store::postgres::PgTaskStore;
use taskboard_shared::telemetry;
use taskboard_tasks::{
    app::{build_router, AppState},
    config::Config,
    directory::HttpIdentityDirectory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("taskboard_tasks=debug,taskboard_shared=debug,tower_http=debug");

    tracing::info!(
        "Taskboard task service v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let pool = create_pool(config.database.clone()).await?;
    Task::initialize(&pool).await?;

    let directory = HttpIdentityDirectory::new(
        config.user_service.url.clone(),
        config.user_service.timeout,
    )
    .context("Failed to build identity service client")?;
    tracing::info!(url = %config.user_service.url, "Identity lookups via HTTP");

    let state = AppState::new(
        Arc::new(PgTaskStore::new(pool.clone())),
        Arc::new(directory),
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
    tracing::info!("Task service stopped");
    Ok(())
}

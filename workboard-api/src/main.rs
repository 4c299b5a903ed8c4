//! # Workboard API Server
//!
//! Multi-tenant work tracking: projects with role-based membership, tasks
//! inside each project's permission boundary, and JWT sessions.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/workboard JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p workboard-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use workboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool},
};
use workboard_shared::store::postgres::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Workboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.pool_config())
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{}", bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    close_pool(pool).await;
    served.context("server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "workboard_api=debug,workboard_shared=debug,tower_http=debug".into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

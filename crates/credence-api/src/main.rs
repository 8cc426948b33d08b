//! # credence-api: Binary Entry Point
//!
//! Reads configuration from the environment, connects the optional
//! database and key custody backend, and serves on `0.0.0.0:$PORT`.

use anyhow::Context;

use credence_api::state::{custody_from_env, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let port = config.port;

    let custody = custody_from_env().context("key custody configuration failed")?;

    let db_pool = credence_api::db::init_pool()
        .await
        .context("database initialization failed")?;

    let state = AppState::new(config, custody, db_pool);
    state
        .hydrate_from_db()
        .await
        .context("database hydration failed")?;

    let app = credence_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "credence API listening");
    axum::serve(listener, app).await?;

    Ok(())
}

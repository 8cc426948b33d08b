//! # credence-api
//!
//! Axum service for the credential trust loop:
//!
//! - `/dids`, `/dids/resolver`: identity manager and DID resolver
//! - `/credentials/*`: issuance, revocation and lookup
//! - `/holder/{holder_did}/credentials`: holder wallets
//! - `/presentation`, `/presentations/{id}`: presentation assembly
//! - `/verify`: credential and presentation verification
//! - `/health/*`: liveness and readiness probes
//! - `/openapi.json`: generated OpenAPI document
//!
//! Handlers share an [`AppState`]: in-memory stores backed by optional
//! Postgres persistence, plus the key custody backend. All failures go out
//! through [`AppError`].

pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::dids::router())
        .merge(routes::credentials::router())
        .merge(routes::holder::router())
        .merge(routes::presentations::router())
        .merge(routes::verify::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}

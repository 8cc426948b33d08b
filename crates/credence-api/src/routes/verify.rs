//! # Verifier
//!
//! `POST /verify` takes a credential or presentation as JSON and reports
//! `VALID` or `INVALID` with a machine-readable reason. Keys come from the
//! DID registry and revocation status from the credential store.
//!
//! | Outcome | Status |
//! |---------|--------|
//! | `VALID` | 200 |
//! | `INVALID(malformed)` | 400 |
//! | any other `INVALID` | 401 |

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use credence_vc::{InvalidReason, VerificationOutcome};

use crate::state::AppState;

fn status_for(outcome: &VerificationOutcome) -> StatusCode {
    match outcome.reason() {
        None => StatusCode::OK,
        Some(InvalidReason::Malformed) => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::UNAUTHORIZED,
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify))
}

/// POST /verify: Verify a credential or presentation.
#[utoipa::path(
    post,
    path = "/verify",
    request_body(content = Object, description = "A verifiable credential or presentation"),
    responses(
        (status = 200, description = "Document is valid: `{\"status\": \"VALID\"}`", body = Object),
        (status = 400, description = "Document is malformed", body = Object),
        (status = 401, description = "Proof, validity period or revocation check failed: `{\"status\": \"INVALID\", \"reason\": ...}`", body = Object),
    ),
    tag = "verify"
)]
pub(crate) async fn verify(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<VerificationOutcome>) {
    let outcome = match body {
        Ok(Json(document)) => state.verifier().verify_document(&document),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "verify body rejected");
            VerificationOutcome::Invalid(InvalidReason::Malformed)
        }
    };
    (status_for(&outcome), Json(outcome))
}

//! # Holder Wallet
//!
//! Tracks which credentials each holder has actually received. A holder can
//! only present credentials recorded here.
//!
//! - `POST /holder/{holder_did}/credentials` accepts a signed credential. It
//!   must verify, and its `credentialSubject.id` must be the holder.
//! - `GET  /holder/{holder_did}/credentials` lists the holder's credentials.
//!
//! Issuance records the holding for the subject automatically.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use credence_core::{Did, Timestamp};
use credence_vc::{VerifiableCredential, VerificationOutcome};

use crate::db;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AppState, CredentialRecord, HolderCredentialRecord};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/holder/{holder_did}/credentials",
        get(list_held_credentials).post(receive_credential),
    )
}

/// Record that `holder` holds `credential_id`.
///
/// Receiving the same credential again keeps the first `received_at`.
pub(crate) async fn record_holding(
    state: &AppState,
    holder: Did,
    credential_id: Uuid,
    received_at: Timestamp,
) -> Result<HolderCredentialRecord, AppError> {
    let key = (holder.clone(), credential_id);
    if let Some(existing) = state.holdings.get(&key) {
        return Ok(existing);
    }

    let record = HolderCredentialRecord {
        holder,
        credential_id,
        received_at,
    };
    if let Some(pool) = &state.db_pool {
        db::holder_credentials::insert(pool, &record).await?;
    }
    if !state.holdings.insert_new(key.clone(), record.clone()) {
        return state
            .holdings
            .get(&key)
            .ok_or_else(|| AppError::Internal("holding vanished after insert race".into()));
    }
    tracing::info!(holder = %record.holder, %credential_id, "recorded credential holding");
    Ok(record)
}

/// POST /holder/{holder_did}/credentials: Receive a credential into a wallet.
#[utoipa::path(
    post,
    path = "/holder/{holder_did}/credentials",
    params(("holder_did" = String, Path, description = "DID of the receiving holder")),
    request_body(content = Object, description = "Signed verifiable credential"),
    responses(
        (status = 201, description = "Credential recorded", body = HolderCredentialRecord),
        (status = 400, description = "Malformed credential", body = crate::error::ErrorBody),
        (status = 401, description = "Credential does not verify or is not about this holder", body = crate::error::ErrorBody),
    ),
    tag = "holder"
)]
pub(crate) async fn receive_credential(
    State(state): State<AppState>,
    Path(holder_did): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<HolderCredentialRecord>), AppError> {
    let holder = Did::new(holder_did)?;
    let raw = extract_json(body)?;

    if let VerificationOutcome::Invalid(reason) = state.verifier().verify_credential(&raw) {
        tracing::warn!(%holder, %reason, "refused to receive credential that does not verify");
        return Err(AppError::Verification(reason));
    }

    let vc: VerifiableCredential = serde_json::from_value(raw)
        .map_err(|e| AppError::MalformedInput(format!("invalid credential: {e}")))?;
    if vc.subject_did().as_ref() != Some(&holder) {
        tracing::warn!(%holder, credential_id = %vc.id, "refused credential issued to another subject");
        return Err(AppError::Unauthorized(
            "credentialSubject.id does not match the holder".into(),
        ));
    }
    let id = vc.credential_id()?;

    let record = record_holding(&state, holder, *id.as_uuid(), Timestamp::now()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /holder/{holder_did}/credentials: Credentials held, in order received.
#[utoipa::path(
    get,
    path = "/holder/{holder_did}/credentials",
    params(("holder_did" = String, Path, description = "DID of the holder")),
    responses(
        (status = 200, description = "Held credentials", body = Vec<CredentialRecord>),
        (status = 400, description = "Malformed DID", body = crate::error::ErrorBody),
    ),
    tag = "holder"
)]
pub(crate) async fn list_held_credentials(
    State(state): State<AppState>,
    Path(holder_did): Path<String>,
) -> Result<Json<Vec<CredentialRecord>>, AppError> {
    let holder = Did::new(holder_did)?;
    let mut held = state.holdings.filter(|h| h.holder == holder);
    held.sort_by(|a, b| {
        a.received_at
            .cmp(&b.received_at)
            .then_with(|| a.credential_id.cmp(&b.credential_id))
    });
    let records = held
        .iter()
        .filter_map(|h| state.credentials.get(&h.credential_id))
        .collect();
    Ok(Json(records))
}

//! # Presentation Assembler
//!
//! - `POST /presentation` bundles credentials the holder has received into a
//!   presentation, signs it with the holder's key from custody, runs the
//!   verifier over it and stores both.
//! - `GET  /presentations/{id}` returns a stored presentation and its
//!   verification outcome.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use credence_core::{CredentialId, Did, PresentationId, Timestamp};
use credence_vc::{VerifiablePresentation, VerificationOutcome};

use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, PresentationRecord};

const MAX_PRESENTED_CREDENTIALS: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationRequest {
    pub holder_did: String,
    /// Ids of credentials the holder has received.
    pub vc_ids: Vec<String>,
}

impl Validate for CreatePresentationRequest {
    fn validate(&self) -> Result<(), String> {
        if self.holder_did.trim().is_empty() {
            return Err("holderDid is required".into());
        }
        if self.vc_ids.is_empty() {
            return Err("vcIds must name at least one credential".into());
        }
        if self.vc_ids.len() > MAX_PRESENTED_CREDENTIALS {
            return Err(format!(
                "at most {MAX_PRESENTED_CREDENTIALS} credentials per presentation"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResponse {
    pub presentation_id: String,
    #[schema(value_type = Object)]
    pub presentation: VerifiablePresentation,
    #[schema(value_type = Object)]
    pub verification: VerificationOutcome,
}

impl From<PresentationRecord> for PresentationResponse {
    fn from(record: PresentationRecord) -> Self {
        Self {
            presentation_id: PresentationId::from_uuid(record.id).to_string(),
            presentation: record.presentation,
            verification: record.verification,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presentation", post(create_presentation))
        .route("/presentations/{id}", get(get_presentation))
}

/// POST /presentation: Assemble, sign and verify a presentation.
#[utoipa::path(
    post,
    path = "/presentation",
    request_body = CreatePresentationRequest,
    responses(
        (status = 202, description = "Presentation signed and submitted for verification", body = PresentationResponse),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
        (status = 404, description = "A credential is not held by this holder", body = crate::error::ErrorBody),
        (status = 500, description = "Holder key unavailable", body = crate::error::ErrorBody),
    ),
    tag = "presentations"
)]
pub(crate) async fn create_presentation(
    State(state): State<AppState>,
    body: Result<Json<CreatePresentationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PresentationResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let holder = Did::new(req.holder_did.trim())?;

    let mut credentials = Vec::with_capacity(req.vc_ids.len());
    for raw_id in &req.vc_ids {
        let id = CredentialId::parse(raw_id.trim())?;
        let not_held = || {
            AppError::NotFound(format!("credential {id} is not held by {holder}"))
        };
        if !state.holdings.contains(&(holder.clone(), *id.as_uuid())) {
            tracing::warn!(%holder, credential_id = %id, "presentation names a credential the holder never received");
            return Err(not_held());
        }
        let record = state.credentials.get(id.as_uuid()).ok_or_else(not_held)?;
        credentials.push(record.credential);
    }

    let key = state.custody.load_signing_key(&holder).await?;

    let id = PresentationId::new();
    let now = Timestamp::now();
    let mut vp = VerifiablePresentation::new(id, holder.clone(), credentials)?;
    vp.sign(&key, now)?;

    let raw = serde_json::to_value(&vp)
        .map_err(|e| AppError::Internal(format!("presentation serialization failed: {e}")))?;
    let verification = state.verifier().at(now).verify_presentation(&raw);

    let record = PresentationRecord {
        id: *id.as_uuid(),
        holder,
        presentation: vp,
        verification,
        created_at: now,
    };
    if let Some(pool) = &state.db_pool {
        db::presentations::insert(pool, &record).await?;
    }
    state.presentations.insert(record.id, record.clone());
    tracing::info!(
        presentation_id = %id,
        holder = %record.holder,
        credentials = record.presentation.verifiable_credential.len(),
        valid = record.verification.is_valid(),
        "created presentation"
    );

    Ok((StatusCode::ACCEPTED, Json(record.into())))
}

/// GET /presentations/{id}: A stored presentation and its verdict.
#[utoipa::path(
    get,
    path = "/presentations/{id}",
    params(("id" = String, Path, description = "Presentation id, `urn:uuid:` or bare UUID")),
    responses(
        (status = 200, description = "Stored presentation", body = PresentationResponse),
        (status = 404, description = "Unknown presentation", body = crate::error::ErrorBody),
    ),
    tag = "presentations"
)]
pub(crate) async fn get_presentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PresentationResponse>, AppError> {
    let id = PresentationId::parse(&id)?;
    state
        .presentations
        .get(id.as_uuid())
        .map(|record| Json(record.into()))
        .ok_or_else(|| AppError::NotFound(format!("presentation {id} not found")))
}

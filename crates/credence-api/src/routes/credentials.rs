//! # Credential Issuer
//!
//! - `POST /credentials` issues one credential per subject, signed with the
//!   issuer's key from custody.
//! - `POST /credentials/revoke` sets the revocation tombstone. Only the
//!   issuing DID may do this, and revoking twice returns the first
//!   `revokedAt`.
//! - `GET  /credentials` lists summaries, filterable by issuer, subject and
//!   revocation status.
//! - `GET  /credentials/{id}` returns one credential with its status.
//!
//! A batch is a set of independent issuances: one subject failing does not
//! stop the others, and each failure is reported in place. Failing to load
//! the issuer key aborts the whole request before anything is signed.

use std::convert::Infallible;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use credence_core::{CredentialId, Did, Timestamp};
use credence_crypto::Ed25519KeyPair;
use credence_vc::VerifiableCredential;

use crate::db;
use crate::error::{AppError, ErrorDetail};
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::holder::record_holding;
use crate::state::{AppState, CredentialRecord};

const MAX_SUBJECTS: usize = 100;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    /// DID of the issuer. Its key must be in custody.
    pub issuer_did: String,
    /// A single subject's attributes.
    #[schema(value_type = Option<Object>)]
    pub subject: Option<Value>,
    /// Several subjects, one credential each.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub subjects: Vec<Value>,
}

impl IssueCredentialRequest {
    fn into_subjects(self) -> Vec<Value> {
        self.subject.into_iter().chain(self.subjects).collect()
    }
}

impl Validate for IssueCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        let count = usize::from(self.subject.is_some()) + self.subjects.len();
        if count == 0 {
            return Err("at least one subject is required".into());
        }
        if count > MAX_SUBJECTS {
            return Err(format!("at most {MAX_SUBJECTS} subjects per request"));
        }
        Ok(())
    }
}

/// Per-subject result. Issued entries are the credential itself.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IssuanceOutcome {
    Issued(Box<VerifiableCredential>),
    Failed(IssuanceFailure),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceFailure {
    /// Position of the subject in the request.
    pub subject_index: usize,
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCredentialRequest {
    pub credential_id: String,
    /// Must be the DID that issued the credential.
    pub issuer_did: String,
}

impl Validate for RevokeCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.credential_id.trim().is_empty() || self.issuer_did.trim().is_empty() {
            return Err("credentialId and issuerDid are required".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevocationResponse {
    pub credential_id: String,
    pub revoked: bool,
    pub revoked_at: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CredentialFilter {
    /// Only credentials from this issuer DID.
    pub issuer: Option<String>,
    /// Only credentials about this subject DID.
    pub subject: Option<String>,
    /// Only revoked (`true`) or unrevoked (`false`) credentials.
    pub revoked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub id: String,
    pub issuer: String,
    pub subject: Option<String>,
    pub issuance_date: String,
    pub expiration_date: String,
    pub revoked: bool,
    pub revoked_at: Option<String>,
}

impl From<&CredentialRecord> for CredentialSummary {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            id: record.credential.id.clone(),
            issuer: record.issuer.to_string(),
            subject: record.subject.as_ref().map(Did::to_string),
            issuance_date: record.credential.issuance_date.clone(),
            expiration_date: record.credential.expiration_date.clone(),
            revoked: record.revoked,
            revoked_at: record.revoked_at.map(|t| t.to_iso8601()),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credentials", get(list_credentials).post(issue_credentials))
        .route("/credentials/revoke", post(revoke_credential))
        .route("/credentials/{id}", get(get_credential))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /credentials: Issue credentials to one or more subjects.
#[utoipa::path(
    post,
    path = "/credentials",
    request_body = IssueCredentialRequest,
    responses(
        (status = 200, description = "One entry per subject: the signed credential, or an IssuanceFailure"),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
        (status = 404, description = "Issuer DID not registered", body = crate::error::ErrorBody),
        (status = 500, description = "Issuer key unavailable", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn issue_credentials(
    State(state): State<AppState>,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<Json<Vec<IssuanceOutcome>>, AppError> {
    let req = extract_validated_json(body)?;
    let issuer = Did::new(req.issuer_did.as_str())?;
    if !state.dids.contains(&issuer) {
        return Err(AppError::NotFound(format!(
            "issuer DID {issuer} is not registered"
        )));
    }

    let key = state.custody.load_signing_key(&issuer).await?;

    let subjects = req.into_subjects();
    let mut outcomes = Vec::with_capacity(subjects.len());
    for (index, subject) in subjects.into_iter().enumerate() {
        match issue_one(&state, &issuer, &key, subject).await {
            Ok(vc) => outcomes.push(IssuanceOutcome::Issued(Box::new(vc))),
            Err(err) => {
                tracing::warn!(%issuer, subject_index = index, error = %err, "credential issuance failed");
                outcomes.push(IssuanceOutcome::Failed(IssuanceFailure {
                    subject_index: index,
                    error: err.body().error,
                }));
            }
        }
    }
    Ok(Json(outcomes))
}

async fn issue_one(
    state: &AppState,
    issuer: &Did,
    key: &Ed25519KeyPair,
    subject: Value,
) -> Result<VerifiableCredential, AppError> {
    if !subject.is_object() {
        return Err(AppError::MalformedInput(
            "credential subject must be a JSON object".into(),
        ));
    }

    let id = CredentialId::new();
    let issued = Timestamp::now();
    let expires = issued
        .checked_add_days(state.config.credential_validity_days)
        .ok_or_else(|| AppError::Internal("credential validity period overflows".into()))?;

    let mut vc = VerifiableCredential::new(id, issuer.clone(), subject, issued, expires)?;
    vc.sign(key, issued)?;
    let record = CredentialRecord::issued(id, vc.clone())?;

    if let Some(pool) = &state.db_pool {
        db::credentials::insert(pool, &record).await?;
    }
    if !state.credentials.insert_new(record.id, record.clone()) {
        return Err(AppError::Conflict(format!("credential {id} already exists")));
    }
    tracing::info!(credential_id = %id, %issuer, subject = ?record.subject.as_ref().map(Did::as_str), "issued credential");

    if let Some(holder) = record.subject {
        if let Err(e) = record_holding(state, holder.clone(), record.id, issued).await {
            tracing::warn!(credential_id = %id, %holder, error = %e, "issued credential but could not record holder custody");
        }
    }
    Ok(vc)
}

/// POST /credentials/revoke: Revoke a credential as its issuer.
#[utoipa::path(
    post,
    path = "/credentials/revoke",
    request_body = RevokeCredentialRequest,
    responses(
        (status = 200, description = "Credential is revoked", body = RevocationResponse),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
        (status = 401, description = "Requester is not the issuer", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown credential", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn revoke_credential(
    State(state): State<AppState>,
    body: Result<Json<RevokeCredentialRequest>, JsonRejection>,
) -> Result<Json<RevocationResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let id = CredentialId::parse(req.credential_id.trim())?;
    let requester = Did::new(req.issuer_did.trim())?;
    let not_found = || AppError::NotFound(format!("credential {id} not found"));

    let record = state.credentials.get(id.as_uuid()).ok_or_else(not_found)?;
    if record.issuer != requester {
        tracing::warn!(credential_id = %id, %requester, "revocation refused: requester is not the issuer");
        return Err(AppError::Unauthorized(
            "only the issuing DID may revoke this credential".into(),
        ));
    }

    let revoked_at = match record.revoked_at.filter(|_| record.revoked) {
        Some(at) => at,
        None => {
            let now = Timestamp::now();
            let stored = match &state.db_pool {
                Some(pool) => db::credentials::mark_revoked(pool, *id.as_uuid(), now)
                    .await?
                    .unwrap_or(now),
                None => now,
            };
            let at = state
                .credentials
                .try_update(id.as_uuid(), |r| {
                    if !r.revoked {
                        r.revoked = true;
                        r.revoked_at = Some(stored);
                    }
                    Ok::<_, Infallible>(r.revoked_at.unwrap_or(stored))
                })
                .and_then(Result::ok)
                .ok_or_else(not_found)?;
            tracing::info!(credential_id = %id, issuer = %requester, revoked_at = %at, "revoked credential");
            at
        }
    };

    Ok(Json(RevocationResponse {
        credential_id: id.to_string(),
        revoked: true,
        revoked_at: revoked_at.to_iso8601(),
    }))
}

/// GET /credentials: Credential summaries, oldest first.
#[utoipa::path(
    get,
    path = "/credentials",
    params(CredentialFilter),
    responses((status = 200, description = "Matching credentials", body = Vec<CredentialSummary>)),
    tag = "credentials"
)]
pub(crate) async fn list_credentials(
    State(state): State<AppState>,
    filter: Result<Query<CredentialFilter>, QueryRejection>,
) -> Result<Json<Vec<CredentialSummary>>, AppError> {
    let Query(filter) = filter.map_err(|e| AppError::MalformedInput(e.body_text()))?;
    let issuer = filter.issuer.map(Did::new).transpose()?;
    let subject = filter.subject.map(Did::new).transpose()?;

    let mut records = state.credentials.filter(|r| {
        issuer.as_ref().map_or(true, |i| &r.issuer == i)
            && subject.as_ref().map_or(true, |s| r.subject.as_ref() == Some(s))
            && filter.revoked.map_or(true, |revoked| r.revoked == revoked)
    });
    records.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(records.iter().map(CredentialSummary::from).collect()))
}

/// GET /credentials/{id}: One credential and its revocation status.
#[utoipa::path(
    get,
    path = "/credentials/{id}",
    params(("id" = String, Path, description = "Credential id, `urn:uuid:` or bare UUID")),
    responses(
        (status = 200, description = "Credential record", body = CredentialRecord),
        (status = 404, description = "Unknown credential", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn get_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CredentialRecord>, AppError> {
    let id = CredentialId::parse(&id)?;
    state
        .credentials
        .get(id.as_uuid())
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_and_batch_subjects_combine_in_order() {
        let req: IssueCredentialRequest = serde_json::from_value(json!({
            "issuerDid": "did:key:z6MkIssuer",
            "subject": {"name": "Alice"},
            "subjects": [{"name": "Bob"}, {"name": "Carol"}]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let names: Vec<_> = req
            .into_subjects()
            .into_iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn empty_and_oversized_batches_rejected() {
        let empty: IssueCredentialRequest =
            serde_json::from_value(json!({"issuerDid": "did:key:z6Mk"})).unwrap();
        assert!(empty.validate().is_err());

        let many = IssueCredentialRequest {
            issuer_did: "did:key:z6Mk".into(),
            subject: None,
            subjects: vec![json!({}); MAX_SUBJECTS + 1],
        };
        assert!(many.validate().is_err());
    }

    #[test]
    fn failure_entry_shape() {
        let failure = IssuanceOutcome::Failed(IssuanceFailure {
            subject_index: 2,
            error: AppError::MalformedInput("bad".into()).body().error,
        });
        let json = serde_json::to_value(failure).unwrap();
        assert_eq!(json["subjectIndex"], 2);
        assert_eq!(json["error"]["code"], "MALFORMED_INPUT");
    }
}

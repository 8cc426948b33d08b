//! # Identity Manager and DID Resolver
//!
//! - `POST /dids` creates an identity: a fresh Ed25519 key, its `did:key`
//!   DID and the public DID document.
//! - `GET  /dids` lists documents in creation order.
//! - `GET  /dids/resolver?did=<did>` resolves one document.
//!
//! The private key goes to key custody before the document is stored
//! anywhere. If custody refuses it, nothing is persisted; if persisting the
//! document fails afterwards, the custody entry is removed again. No DID is
//! ever published without a retrievable key.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use credence_core::{Did, Timestamp};
use credence_crypto::Ed25519KeyPair;
use credence_vc::DidDocument;

use crate::db;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

const MAX_ORGANIZATION_ID_LEN: usize = 256;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDidRequest {
    /// Owning organization. Defaults to the configured organization.
    pub organization_id: Option<String>,
}

impl Validate for CreateDidRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.organization_id {
            Some(org) if org.len() > MAX_ORGANIZATION_ID_LEN => Err(format!(
                "organizationId must not exceed {MAX_ORGANIZATION_ID_LEN} characters"
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResolveQuery {
    /// The DID to resolve, URL-encoded.
    pub did: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dids", get(list_dids).post(create_did))
        .route("/dids/resolver", get(resolve_did))
}

/// POST /dids: Create a new identity.
#[utoipa::path(
    post,
    path = "/dids",
    request_body = CreateDidRequest,
    responses(
        (status = 201, description = "DID document created"),
        (status = 400, description = "Malformed request", body = crate::error::ErrorBody),
        (status = 500, description = "Key custody rejected the private key", body = crate::error::ErrorBody),
        (status = 503, description = "Document store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "dids"
)]
pub(crate) async fn create_did(
    State(state): State<AppState>,
    body: Result<Json<CreateDidRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DidDocument>), AppError> {
    let req = extract_validated_json(body)?;
    let organization_id = req
        .organization_id
        .filter(|org| !org.trim().is_empty())
        .unwrap_or_else(|| state.config.default_organization_id.clone());

    let key = Ed25519KeyPair::generate()
        .map_err(|e| AppError::Internal(format!("key generation failed: {e}")))?;
    let doc = DidDocument::new(key.public_key(), Some(organization_id), Timestamp::now())?;
    let did = doc.id.clone();

    state.custody.store_signing_key(&did, &key).await?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::did_documents::insert(pool, &doc).await {
            tracing::error!(%did, error = %e, "failed to persist DID document, withdrawing custody key");
            let path = state.custody.path_for(&did);
            if let Err(cleanup) = state.custody.delete(&path).await {
                tracing::error!(%did, error = %cleanup, "failed to withdraw custody key");
            }
            return Err(e.into());
        }
    }

    state.dids.insert(did.clone(), doc.clone());
    tracing::info!(
        %did,
        organization_id = doc.organization_id.as_deref().unwrap_or_default(),
        custody = state.custody.backend_name(),
        "created DID"
    );
    Ok((StatusCode::CREATED, Json(doc)))
}

/// GET /dids: All DID documents, oldest first.
#[utoipa::path(
    get,
    path = "/dids",
    responses((status = 200, description = "DID documents in creation order")),
    tag = "dids"
)]
pub(crate) async fn list_dids(State(state): State<AppState>) -> Json<Vec<DidDocument>> {
    let mut docs = state.dids.list();
    docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Json(docs)
}

/// GET /dids/resolver?did=: Resolve a DID to its document.
#[utoipa::path(
    get,
    path = "/dids/resolver",
    params(ResolveQuery),
    responses(
        (status = 200, description = "DID document"),
        (status = 400, description = "Missing or malformed DID", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown DID", body = crate::error::ErrorBody),
    ),
    tag = "dids"
)]
pub(crate) async fn resolve_did(
    State(state): State<AppState>,
    query: Result<Query<ResolveQuery>, QueryRejection>,
) -> Result<Json<DidDocument>, AppError> {
    let Query(query) = query.map_err(|e| AppError::MalformedInput(e.body_text()))?;
    let raw = query
        .did
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::MalformedInput("missing required query parameter: did".into()))?;
    let did = Did::new(raw)?;
    state
        .dids
        .get(&did)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("DID {did} is not registered")))
}

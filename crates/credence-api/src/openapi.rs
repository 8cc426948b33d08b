//! # OpenAPI Document
//!
//! Every documented route and DTO, served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Credence API",
        version = "0.1.0",
        description = "DID creation and resolution, Ed25519 credential issuance and revocation, holder wallets, presentations and verification."
    ),
    paths(
        // DIDs
        crate::routes::dids::create_did,
        crate::routes::dids::list_dids,
        crate::routes::dids::resolve_did,
        // Credentials
        crate::routes::credentials::issue_credentials,
        crate::routes::credentials::revoke_credential,
        crate::routes::credentials::list_credentials,
        crate::routes::credentials::get_credential,
        // Holder
        crate::routes::holder::receive_credential,
        crate::routes::holder::list_held_credentials,
        // Presentations
        crate::routes::presentations::create_presentation,
        crate::routes::presentations::get_presentation,
        // Verify
        crate::routes::verify::verify,
    ),
    components(schemas(
        crate::state::CredentialRecord,
        crate::state::HolderCredentialRecord,
        crate::state::PresentationRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::dids::CreateDidRequest,
        crate::routes::credentials::IssueCredentialRequest,
        crate::routes::credentials::IssuanceFailure,
        crate::routes::credentials::RevokeCredentialRequest,
        crate::routes::credentials::RevocationResponse,
        crate::routes::credentials::CredentialSummary,
        crate::routes::presentations::CreatePresentationRequest,
        crate::routes::presentations::PresentationResponse,
    )),
    tags(
        (name = "dids", description = "Identity manager and DID resolver"),
        (name = "credentials", description = "Credential issuance and revocation"),
        (name = "holder", description = "Holder wallets"),
        (name = "presentations", description = "Presentation assembly"),
        (name = "verify", description = "Credential and presentation verification"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

//! # API Error Types
//!
//! One error type for every handler, mapped onto the failure taxonomy:
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `MalformedInput` | 400 | `MALFORMED_INPUT` |
//! | `Unauthorized` | 401 | `UNAUTHORIZED` |
//! | `Verification` | 401 (400 for `malformed`) | `SIGNATURE_INVALID`, `EXPIRED`, `REVOKED`, `VERIFICATION_FAILED` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `Conflict` | 409 | `CONFLICT` |
//! | `KeyUnavailable` | 500 | `KEY_UNAVAILABLE` |
//! | `Internal` | 500 | `INTERNAL_ERROR` |
//! | `StoreUnavailable` | 503 | `STORE_UNAVAILABLE` |
//!
//! Server-side messages never reach the client; they are logged instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use credence_crypto::KeyCustodyError;
use credence_vc::{InvalidReason, VcError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "KEY_UNAVAILABLE").
    pub code: String,
    pub message: String,
    /// Extra context for client errors, e.g. the verification `reason`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not the issuer or holder it claims to act for.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A submitted document failed verification.
    #[error("verification failed: {0}")]
    Verification(InvalidReason),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Key custody could not produce or accept a signing key.
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),

    /// The persistent store is unreachable. Safe to retry.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub(crate) fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MalformedInput(_) => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Verification(reason) => match reason {
                InvalidReason::Malformed => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
                InvalidReason::BadSignature | InvalidReason::MissingProof => {
                    (StatusCode::UNAUTHORIZED, "SIGNATURE_INVALID")
                }
                InvalidReason::Expired => (StatusCode::UNAUTHORIZED, "EXPIRED"),
                InvalidReason::Revoked(_) => (StatusCode::UNAUTHORIZED, "REVOKED"),
                _ => (StatusCode::UNAUTHORIZED, "VERIFICATION_FAILED"),
            },
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::KeyUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "KEY_UNAVAILABLE"),
            Self::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Body for this error, as sent to clients.
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        let message = match self {
            Self::KeyUnavailable(_) => "Signing key is unavailable".to_string(),
            Self::StoreUnavailable(_) => "Storage is temporarily unavailable".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            Self::Verification(reason) => Some(serde_json::json!({ "reason": reason.to_string() })),
            _ => None,
        };
        ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        match &self {
            Self::KeyUnavailable(_) => tracing::error!(error = %self, "key custody failure"),
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::StoreUnavailable(_) => tracing::warn!(error = %self, "store unavailable"),
            _ => {}
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<credence_core::ValidationError> for AppError {
    fn from(err: credence_core::ValidationError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<KeyCustodyError> for AppError {
    fn from(err: KeyCustodyError) -> Self {
        Self::KeyUnavailable(err.to_string())
    }
}

impl From<VcError> for AppError {
    fn from(err: VcError) -> Self {
        match err {
            VcError::Canonicalization(_)
            | VcError::Json(_)
            | VcError::Validation(_)
            | VcError::InvalidDateOrder { .. }
            | VcError::NoCredentials => Self::MalformedInput(err.to_string()),
            VcError::Crypto(_)
            | VcError::AlreadySigned
            | VcError::SignerMismatch { .. }
            | VcError::NotSelfCertifying { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict("record already exists".to_string())
            }
            sqlx::Error::RowNotFound => Self::NotFound(err.to_string()),
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

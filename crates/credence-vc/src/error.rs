//! Errors from building and signing W3C documents.

use credence_core::{CanonicalizationError, CryptoError, Did, ValidationError};
use thiserror::Error;

/// Errors from VC/VP construction and signing.
#[derive(Error, Debug)]
pub enum VcError {
    /// Canonicalization of the document body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An identifier or timestamp is malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Key encoding or derivation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// `issuanceDate` is after `expirationDate`.
    #[error("issuance date {issued} is after expiration date {expires}")]
    InvalidDateOrder { issued: String, expires: String },

    /// The document already carries a proof.
    #[error("document is already signed")]
    AlreadySigned,

    /// The signing key does not belong to the DID the proof would name.
    #[error("signing key derives {actual}, expected {expected}")]
    SignerMismatch { expected: Did, actual: Did },

    /// A presentation must carry at least one credential.
    #[error("presentation contains no credentials")]
    NoCredentials,

    /// A DID document's `id` does not re-derive from its `publicKey`.
    #[error("DID document {id} is not self-certifying: publicKey derives {derived}")]
    NotSelfCertifying { id: Did, derived: Did },
}

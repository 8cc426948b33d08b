//! # Error Types
//!
//! Error hierarchy shared by every Credence crate. All errors derive their
//! `Display` and `Error` impls through `thiserror`.
//!
//! Cryptographic errors carry enough context to identify the failing key or
//! payload, but never the secret material itself.

use thiserror::Error;

/// Top-level error type for the Credence core primitives.
#[derive(Error, Debug)]
pub enum CredenceError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier or timestamp failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cryptographic operation failed.
    #[error("cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in signed payloads.
    /// Numeric claims must be strings or integers.
    #[error("float values are not permitted in signed payloads; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation failures for identifiers and timestamps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to `did:<method>:<identifier>`.
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// Verification method is not a `<did>#<fragment>` DID URL.
    #[error("invalid verification method: \"{0}\" (expected <did>#<fragment>)")]
    InvalidVerificationMethod(String),

    /// Credential or presentation identifier is not a `urn:uuid:` URN.
    #[error("invalid identifier: \"{0}\" (expected urn:uuid:<uuid>)")]
    InvalidIdentifier(String),

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Base64 or base58 decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

//! # Proof Objects
//!
//! The detached proof carried under a document's `proof` member:
//!
//! ```json
//! {
//!   "type": "Ed25519Signature2018",
//!   "created": "2026-01-15T12:00:00Z",
//!   "verificationMethod": "did:key:z6Mk...#keys-1",
//!   "proofPurpose": "assertionMethod",
//!   "proofValue": "<base64 Ed25519 signature>"
//! }
//! ```
//!
//! `proofValue` is the standard-base64 signature over the JCS bytes of the
//! document with `proof` removed. An empty or absent `proofValue` is treated
//! as a missing proof.

use serde::{Deserialize, Serialize};

use credence_core::Timestamp;
use credence_crypto::Ed25519Signature;

/// Signature suite named in `proof.type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// The suite Credence issues with.
    Ed25519Signature2018,
    /// Accepted on verification; same signing input and encoding.
    Ed25519Signature2020,
    /// Any other suite. Never verifies.
    #[serde(other)]
    Unsupported,
}

impl ProofType {
    /// Returns `true` for the Ed25519 suites.
    pub fn is_ed25519(&self) -> bool {
        matches!(self, Self::Ed25519Signature2018 | Self::Ed25519Signature2020)
    }
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519Signature2018 => f.write_str("Ed25519Signature2018"),
            Self::Ed25519Signature2020 => f.write_str("Ed25519Signature2020"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Why the proof was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// An issuer asserting credential claims.
    AssertionMethod,
    /// A holder proving control over a presentation.
    Authentication,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssertionMethod => f.write_str("assertionMethod"),
            Self::Authentication => f.write_str("authentication"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// A detached signature proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// Creation time as received. Informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,

    /// DID URL of the signing key, `<did>#keys-1`.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// Base64 signature. Empty means the document is unsigned.
    #[serde(rename = "proofValue", default)]
    pub proof_value: String,
}

impl Proof {
    /// Build an `Ed25519Signature2018` proof from a finished signature.
    pub fn new_ed25519(
        verification_method: String,
        purpose: ProofPurpose,
        created: Timestamp,
        signature: &Ed25519Signature,
    ) -> Self {
        Self {
            proof_type: ProofType::Ed25519Signature2018,
            created: created.to_iso8601(),
            verification_method,
            proof_purpose: purpose,
            proof_value: signature.to_base64(),
        }
    }

    /// Whether a signature is actually present.
    pub fn has_value(&self) -> bool {
        !self.proof_value.trim().is_empty()
    }
}

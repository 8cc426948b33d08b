//! # DID Documents
//!
//! The public record of an identity:
//!
//! ```json
//! {
//!   "@context": "https://www.w3.org/ns/did/v1",
//!   "id": "did:key:z6Mk...",
//!   "publicKey": "z6Mk...",
//!   "createdAt": "2026-01-15T12:00:00Z",
//!   "organizationId": "default-org"
//! }
//! ```
//!
//! The document never carries private material. `id` is derived from
//! `publicKey`, so a stored document can be checked for tampering with
//! [`DidDocument::verify_self_certifying`].

use serde::{Deserialize, Serialize};

use credence_core::{Did, Timestamp};
use credence_crypto::{did_from_public_key, Ed25519PublicKey};

use crate::{VcError, DID_V1_CONTEXT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: String,

    pub id: Did,

    /// Multibase `z…` encoding of the Ed25519 public key.
    #[serde(rename = "publicKey")]
    pub public_key: Ed25519PublicKey,

    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,

    #[serde(rename = "organizationId", default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl DidDocument {
    /// Build the document for a freshly generated public key.
    pub fn new(
        public_key: Ed25519PublicKey,
        organization_id: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, VcError> {
        Ok(Self {
            context: DID_V1_CONTEXT.to_string(),
            id: did_from_public_key(&public_key)?,
            public_key,
            created_at,
            organization_id,
        })
    }

    /// Check that `id` re-derives from `publicKey`.
    pub fn verify_self_certifying(&self) -> Result<(), VcError> {
        let derived = did_from_public_key(&self.public_key)?;
        if derived != self.id {
            return Err(VcError::NotSelfCertifying {
                id: self.id.clone(),
                derived,
            });
        }
        Ok(())
    }
}

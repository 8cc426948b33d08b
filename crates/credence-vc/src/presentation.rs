//! # Verifiable Presentations
//!
//! A holder-signed bundle of credentials. The presentation proof covers the
//! whole payload, embedded credentials and their own proofs included, and
//! is made with the holder's key under `authentication`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use credence_core::{Did, PresentationId, Timestamp};
use credence_crypto::{did_from_public_key, Ed25519KeyPair};

use crate::credential::{ContextValue, CredentialTypeValue, VerifiableCredential};
use crate::proof::{Proof, ProofPurpose};
use crate::{signing_input, VcError};

/// Type name every presentation carries.
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiablePresentation {
    #[serde(rename = "@context", default)]
    pub context: ContextValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub presentation_type: CredentialTypeValue,

    pub holder: Did,

    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<VerifiableCredential>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiablePresentation {
    /// Build an unsigned presentation.
    ///
    /// # Errors
    ///
    /// [`VcError::NoCredentials`] when `credentials` is empty.
    pub fn new(
        id: PresentationId,
        holder: Did,
        credentials: Vec<VerifiableCredential>,
    ) -> Result<Self, VcError> {
        if credentials.is_empty() {
            return Err(VcError::NoCredentials);
        }
        Ok(Self {
            context: ContextValue::credentials_v1(),
            id: Some(id.to_string()),
            presentation_type: CredentialTypeValue::Array(vec![
                VERIFIABLE_PRESENTATION_TYPE.to_string(),
            ]),
            holder,
            verifiable_credential: credentials,
            proof: None,
            extra: Map::new(),
        })
    }

    /// Sign with the holder's key and attach an `authentication` proof.
    pub fn sign(&mut self, key: &Ed25519KeyPair, created: Timestamp) -> Result<(), VcError> {
        if self.proof.is_some() {
            return Err(VcError::AlreadySigned);
        }
        let signer = did_from_public_key(&key.public_key())?;
        if signer != self.holder {
            return Err(VcError::SignerMismatch {
                expected: self.holder.clone(),
                actual: signer,
            });
        }
        let input = signing_input(&serde_json::to_value(&*self)?)?;
        let signature = key.sign(&input);
        self.proof = Some(Proof::new_ed25519(
            self.holder.verification_method(),
            ProofPurpose::Authentication,
            created,
            &signature,
        ));
        Ok(())
    }

    /// Parsed presentation id, when it is a `urn:uuid:`.
    pub fn presentation_id(&self) -> Option<PresentationId> {
        self.id.as_deref().and_then(|s| PresentationId::parse(s).ok())
    }
}

//! # Verifiable Credentials
//!
//! The credential envelope and issuer-side signing.
//!
//! A credential is built unsigned with [`VerifiableCredential::new`] and
//! signed exactly once with [`VerifiableCredential::sign`]. Dates are kept
//! as the strings that were signed so that a stored credential re-serializes
//! to the same canonical bytes, and members this model does not name are
//! carried through `extra` for the same reason.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use credence_core::{CredentialId, Did, Timestamp, ValidationError};
use credence_crypto::{did_from_public_key, Ed25519KeyPair};

use crate::proof::{Proof, ProofPurpose};
use crate::{signing_input, VcError, CREDENTIALS_V1_CONTEXT};

/// Type name every credential carries.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// `@context`: a single URI or an array of URIs / inline contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Single(String),
    Array(Vec<Value>),
}

impl ContextValue {
    /// The single-entry array `["https://www.w3.org/2018/credentials/v1"]`.
    pub fn credentials_v1() -> Self {
        Self::Array(vec![Value::String(CREDENTIALS_V1_CONTEXT.to_string())])
    }
}

impl Default for ContextValue {
    fn default() -> Self {
        Self::credentials_v1()
    }
}

/// `type`: a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialTypeValue {
    Single(String),
    Array(Vec<String>),
}

impl CredentialTypeValue {
    /// Whether `name` is among the declared types.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(s) => s == name,
            Self::Array(arr) => arr.iter().any(|s| s == name),
        }
    }
}

/// A W3C Verifiable Credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(rename = "@context", default)]
    pub context: ContextValue,

    /// `urn:uuid:<v4>` for credentials issued here.
    pub id: String,

    #[serde(rename = "type")]
    pub credential_type: CredentialTypeValue,

    pub issuer: Did,

    #[serde(rename = "issuanceDate")]
    pub issuance_date: String,

    #[serde(rename = "expirationDate")]
    pub expiration_date: String,

    /// Arbitrary claims about the subject; `id` names the subject DID.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiableCredential {
    /// Build an unsigned credential.
    ///
    /// # Errors
    ///
    /// [`VcError::InvalidDateOrder`] when `issued` is after `expires`.
    pub fn new(
        id: CredentialId,
        issuer: Did,
        credential_subject: Value,
        issued: Timestamp,
        expires: Timestamp,
    ) -> Result<Self, VcError> {
        if issued > expires {
            return Err(VcError::InvalidDateOrder {
                issued: issued.to_iso8601(),
                expires: expires.to_iso8601(),
            });
        }
        Ok(Self {
            context: ContextValue::credentials_v1(),
            id: id.to_string(),
            credential_type: CredentialTypeValue::Array(vec![
                VERIFIABLE_CREDENTIAL_TYPE.to_string()
            ]),
            issuer,
            issuance_date: issued.to_iso8601(),
            expiration_date: expires.to_iso8601(),
            credential_subject,
            proof: None,
            extra: Map::new(),
        })
    }

    /// Sign with the issuer's key and attach an `assertionMethod` proof.
    ///
    /// # Errors
    ///
    /// - [`VcError::AlreadySigned`] if a proof is already attached.
    /// - [`VcError::SignerMismatch`] if `key` does not derive `issuer`.
    /// - [`VcError::Canonicalization`] if the subject contains floats.
    pub fn sign(&mut self, key: &Ed25519KeyPair, created: Timestamp) -> Result<(), VcError> {
        if self.proof.is_some() {
            return Err(VcError::AlreadySigned);
        }
        let signer = did_from_public_key(&key.public_key())?;
        if signer != self.issuer {
            return Err(VcError::SignerMismatch {
                expected: self.issuer.clone(),
                actual: signer,
            });
        }
        let input = signing_input(&serde_json::to_value(&*self)?)?;
        let signature = key.sign(&input);
        self.proof = Some(Proof::new_ed25519(
            self.issuer.verification_method(),
            ProofPurpose::AssertionMethod,
            created,
            &signature,
        ));
        Ok(())
    }

    /// The subject DID from `credentialSubject.id`, when present and valid.
    pub fn subject_did(&self) -> Option<Did> {
        self.credential_subject
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Did::new(s).ok())
    }

    /// Parsed credential id, for credentials using `urn:uuid:` ids.
    pub fn credential_id(&self) -> Result<CredentialId, ValidationError> {
        CredentialId::parse(&self.id)
    }

    pub fn issued_at(&self) -> Result<Timestamp, ValidationError> {
        Timestamp::parse_lenient(&self.issuance_date)
    }

    pub fn expires_at(&self) -> Result<Timestamp, ValidationError> {
        Timestamp::parse_lenient(&self.expiration_date)
    }

    pub fn is_signed(&self) -> bool {
        self.proof.as_ref().is_some_and(Proof::has_value)
    }
}

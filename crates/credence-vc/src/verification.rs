//! # Verification
//!
//! Runs a received credential or presentation through the checks below and
//! ends in `VALID` or `INVALID(reason)`. The first failing check decides the
//! reason.
//!
//! | Step | Check | Reason on failure |
//! |------|-------|-------------------|
//! | 1 | Required members present, dates parse | `malformed` |
//! | 2 | `now <= expirationDate`, then `issuanceDate <= expirationDate` | `expired`, `invalid-date-order` |
//! | 3 | `proof.proofValue` non-empty | `missing-proof` |
//! | 4 | Signer resolves and the Ed25519 signature verifies | `unresolvable-signer`, `bad-signature` |
//! | 5 | Credential is known and not revoked | `revocation-unknown`, `revoked:<id>` |
//!
//! A presentation runs steps 1, 3 and 4 on its own proof (it has no dates),
//! then every embedded credential runs all five steps and must name the
//! presentation holder as its subject (`holder-mismatch`).
//!
//! Signatures are always checked against the JSON exactly as received.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use credence_core::{Did, Timestamp, PRIMARY_KEY_FRAGMENT};
use credence_crypto::{public_key_from_did, verify, Ed25519PublicKey, Ed25519Signature};

use crate::credential::{VerifiableCredential, VERIFIABLE_CREDENTIAL_TYPE};
use crate::presentation::{VerifiablePresentation, VERIFIABLE_PRESENTATION_TYPE};
use crate::proof::Proof;
use crate::signing_input;

// ---------------------------------------------------------------------------
// Lookup seams
// ---------------------------------------------------------------------------

/// Maps a signer DID to its verification key.
pub trait KeyResolver {
    fn resolve_key(&self, did: &Did) -> Option<Ed25519PublicKey>;
}

/// Current revocation status of a credential id.
pub trait RevocationLookup {
    fn status(&self, credential_id: &str) -> RevocationState;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationState {
    Active,
    Revoked { revoked_at: Timestamp },
    /// The credential is not known to the registry.
    Unknown,
}

/// Resolves `did:key` identifiers by decoding the key from the DID itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyResolver;

impl KeyResolver for DidKeyResolver {
    fn resolve_key(&self, did: &Did) -> Option<Ed25519PublicKey> {
        public_key_from_did(did).ok()
    }
}

impl KeyResolver for HashMap<Did, Ed25519PublicKey> {
    fn resolve_key(&self, did: &Did) -> Option<Ed25519PublicKey> {
        self.get(did).copied()
    }
}

/// An offline deny-list: listed ids are revoked, everything else is active.
#[derive(Debug, Clone, Default)]
pub struct RevocationList {
    revoked: HashSet<String>,
    listed_at: Option<Timestamp>,
}

impl RevocationList {
    pub fn new(revoked: impl IntoIterator<Item = String>) -> Self {
        Self {
            revoked: revoked.into_iter().collect(),
            listed_at: None,
        }
    }

    /// Stamp reported as `revoked_at` for listed credentials.
    pub fn with_listed_at(mut self, at: Timestamp) -> Self {
        self.listed_at = Some(at);
        self
    }
}

impl RevocationLookup for RevocationList {
    fn status(&self, credential_id: &str) -> RevocationState {
        if self.revoked.contains(credential_id) {
            RevocationState::Revoked {
                revoked_at: self.listed_at.unwrap_or_else(Timestamp::now),
            }
        } else {
            RevocationState::Active
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Machine-readable reason for an `INVALID` outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Malformed,
    Expired,
    InvalidDateOrder,
    MissingProof,
    BadSignature,
    UnresolvableSigner,
    RevocationUnknown,
    HolderMismatch,
    /// Carries the id of the revoked credential.
    Revoked(String),
}

const REVOKED_PREFIX: &str = "revoked:";

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => f.write_str("malformed"),
            Self::Expired => f.write_str("expired"),
            Self::InvalidDateOrder => f.write_str("invalid-date-order"),
            Self::MissingProof => f.write_str("missing-proof"),
            Self::BadSignature => f.write_str("bad-signature"),
            Self::UnresolvableSigner => f.write_str("unresolvable-signer"),
            Self::RevocationUnknown => f.write_str("revocation-unknown"),
            Self::HolderMismatch => f.write_str("holder-mismatch"),
            Self::Revoked(id) => write!(f, "{REVOKED_PREFIX}{id}"),
        }
    }
}

impl FromStr for InvalidReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "malformed" => Self::Malformed,
            "expired" => Self::Expired,
            "invalid-date-order" => Self::InvalidDateOrder,
            "missing-proof" => Self::MissingProof,
            "bad-signature" => Self::BadSignature,
            "unresolvable-signer" => Self::UnresolvableSigner,
            "revocation-unknown" => Self::RevocationUnknown,
            "holder-mismatch" => Self::HolderMismatch,
            other => match other.strip_prefix(REVOKED_PREFIX) {
                Some(id) => Self::Revoked(id.trim().to_string()),
                None => return Err(format!("unknown verification reason: {other}")),
            },
        })
    }
}

/// Terminal state of a verification run.
///
/// Serializes as `{"status": "VALID"}` or
/// `{"status": "INVALID", "reason": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    Invalid(InvalidReason),
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn reason(&self) -> Option<&InvalidReason> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeWire {
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Serialize for VerificationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Valid => OutcomeWire {
                status: "VALID".into(),
                reason: None,
            },
            Self::Invalid(reason) => OutcomeWire {
                status: "INVALID".into(),
                reason: Some(reason.to_string()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerificationOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = OutcomeWire::deserialize(deserializer)?;
        match (wire.status.as_str(), wire.reason) {
            ("VALID", _) => Ok(Self::Valid),
            ("INVALID", Some(reason)) => reason
                .parse()
                .map(Self::Invalid)
                .map_err(serde::de::Error::custom),
            (status, _) => Err(serde::de::Error::custom(format!(
                "invalid verification status: {status}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

type Check = Result<(), InvalidReason>;

/// Verifies credentials and presentations against a key resolver and a
/// revocation registry, as of a fixed instant.
pub struct Verifier<'a, R: ?Sized, L: ?Sized> {
    resolver: &'a R,
    revocation: &'a L,
    now: Timestamp,
}

impl<'a, R, L> Verifier<'a, R, L>
where
    R: KeyResolver + ?Sized,
    L: RevocationLookup + ?Sized,
{
    pub fn new(resolver: &'a R, revocation: &'a L) -> Self {
        Self {
            resolver,
            revocation,
            now: Timestamp::now(),
        }
    }

    /// Evaluate temporal checks as of `now` instead of the wall clock.
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }

    /// Verify a credential or presentation, dispatching on `type`.
    pub fn verify_document(&self, document: &Value) -> VerificationOutcome {
        let declared = |name: &str| match document.get("type") {
            Some(Value::String(s)) => s == name,
            Some(Value::Array(items)) => items.iter().any(|t| t.as_str() == Some(name)),
            _ => false,
        };
        if declared(VERIFIABLE_PRESENTATION_TYPE) {
            self.verify_presentation(document)
        } else if declared(VERIFIABLE_CREDENTIAL_TYPE) {
            self.verify_credential(document)
        } else {
            outcome(Err(InvalidReason::Malformed), "document")
        }
    }

    /// Verify a single credential.
    pub fn verify_credential(&self, raw: &Value) -> VerificationOutcome {
        outcome(self.check_credential(raw).map(|_| ()), "credential")
    }

    /// Verify a presentation and every credential it embeds.
    pub fn verify_presentation(&self, raw: &Value) -> VerificationOutcome {
        outcome(self.check_presentation(raw), "presentation")
    }

    fn check_credential(&self, raw: &Value) -> Result<VerifiableCredential, InvalidReason> {
        let vc: VerifiableCredential =
            serde_json::from_value(raw.clone()).map_err(|_| InvalidReason::Malformed)?;
        if vc.id.trim().is_empty() || !vc.credential_type.contains(VERIFIABLE_CREDENTIAL_TYPE) {
            return Err(InvalidReason::Malformed);
        }
        let issued = vc.issued_at().map_err(|_| InvalidReason::Malformed)?;
        let expires = vc.expires_at().map_err(|_| InvalidReason::Malformed)?;

        if self.now > expires {
            return Err(InvalidReason::Expired);
        }
        if issued > expires {
            return Err(InvalidReason::InvalidDateOrder);
        }

        let proof = present_proof(vc.proof.as_ref())?;
        self.check_signature(raw, proof, &vc.issuer)?;

        match self.revocation.status(&vc.id) {
            RevocationState::Active => Ok(vc),
            RevocationState::Revoked { .. } => Err(InvalidReason::Revoked(vc.id.clone())),
            RevocationState::Unknown => Err(InvalidReason::RevocationUnknown),
        }
    }

    fn check_presentation(&self, raw: &Value) -> Check {
        let vp: VerifiablePresentation =
            serde_json::from_value(raw.clone()).map_err(|_| InvalidReason::Malformed)?;
        if vp.verifiable_credential.is_empty() {
            return Err(InvalidReason::Malformed);
        }

        let proof = present_proof(vp.proof.as_ref())?;
        self.check_signature(raw, proof, &vp.holder)?;

        let embedded = raw
            .get("verifiableCredential")
            .and_then(Value::as_array)
            .ok_or(InvalidReason::Malformed)?;
        for raw_vc in embedded {
            let vc = self.check_credential(raw_vc)?;
            if vc.subject_did().as_ref() != Some(&vp.holder) {
                return Err(InvalidReason::HolderMismatch);
            }
        }
        Ok(())
    }

    fn check_signature(&self, raw: &Value, proof: &Proof, expected_signer: &Did) -> Check {
        if !proof.proof_type.is_ed25519() {
            return Err(InvalidReason::BadSignature);
        }
        let (signer, fragment) = Did::from_verification_method(&proof.verification_method)
            .map_err(|_| InvalidReason::BadSignature)?;
        if &signer != expected_signer {
            return Err(InvalidReason::BadSignature);
        }
        if fragment != PRIMARY_KEY_FRAGMENT {
            return Err(InvalidReason::UnresolvableSigner);
        }
        let key = self
            .resolver
            .resolve_key(&signer)
            .ok_or(InvalidReason::UnresolvableSigner)?;
        let signature = Ed25519Signature::from_base64(proof.proof_value.trim())
            .map_err(|_| InvalidReason::BadSignature)?;
        let input = signing_input(raw).map_err(|_| InvalidReason::Malformed)?;
        verify(&input, &signature, &key).map_err(|_| InvalidReason::BadSignature)
    }
}

fn present_proof(proof: Option<&Proof>) -> Result<&Proof, InvalidReason> {
    proof
        .filter(|p| p.has_value())
        .ok_or(InvalidReason::MissingProof)
}

fn outcome(result: Check, kind: &'static str) -> VerificationOutcome {
    match result {
        Ok(()) => {
            tracing::debug!(kind, "verification passed");
            VerificationOutcome::Valid
        }
        Err(reason) => {
            tracing::info!(kind, %reason, "verification failed");
            VerificationOutcome::Invalid(reason)
        }
    }
}

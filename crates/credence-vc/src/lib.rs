//! # credence-vc: Verifiable Credentials
//!
//! - **DID documents** (`did_document.rs`): the public half of an identity,
//!   self-certifying through `did:key`.
//! - **Credentials** (`credential.rs`): construction and issuer signing.
//! - **Presentations** (`presentation.rs`): holder-signed bundles of
//!   credentials.
//! - **Proofs** (`proof.rs`): the detached Ed25519 proof object.
//! - **Verification** (`verification.rs`): the `VALID` / `INVALID(reason)`
//!   state machine run over received JSON.
//!
//! ## Security Invariant
//!
//! Signing input is the JCS canonicalization of the document with its
//! `proof` member removed. Issuance and verification both go through
//! [`signing_input`], and verification always works from the JSON exactly
//! as received, never from a re-serialized typed value.

pub mod credential;
pub mod did_document;
pub mod error;
pub mod presentation;
pub mod proof;
pub mod verification;

use credence_core::CanonicalBytes;

pub use credential::{ContextValue, CredentialTypeValue, VerifiableCredential};
pub use did_document::DidDocument;
pub use error::VcError;
pub use presentation::VerifiablePresentation;
pub use proof::{Proof, ProofPurpose, ProofType};
pub use verification::{
    DidKeyResolver, InvalidReason, KeyResolver, RevocationList, RevocationLookup,
    RevocationState, VerificationOutcome, Verifier,
};

/// JSON-LD context for W3C Verifiable Credentials v1.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// JSON-LD context for DID documents.
pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Canonical signing input of a JSON document: the document without its
/// top-level `proof` member, JCS-serialized.
pub fn signing_input(document: &serde_json::Value) -> Result<CanonicalBytes, VcError> {
    let mut body = document.clone();
    if let Some(obj) = body.as_object_mut() {
        obj.remove("proof");
    }
    Ok(CanonicalBytes::new(&body)?)
}

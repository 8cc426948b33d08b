//! # credence-core: Foundational Types for the Credence Trust Pipeline
//!
//! Leaf crate of the workspace. Every signed artifact in Credence (DID
//! documents, credentials, presentations) flows through the primitives
//! defined here before any key touches it.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Signing and verification accept only
//!    `&CanonicalBytes`, produced by JCS (RFC 8785) serialization. Ambient
//!    map ordering can never reach a signature.
//!
//! 2. **Validated identifiers.** `Did` is checked against the
//!    `did:<method>:<id>` grammar at construction; credential and
//!    presentation ids are distinct newtypes.
//!
//! 3. **UTC-only timestamps.** `Timestamp` renders `YYYY-MM-DDTHH:MM:SSZ`,
//!    the exact form embedded in signed payloads.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `credence-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CredenceError, CryptoError, ValidationError};
pub use identity::{CredentialId, Did, PresentationId, PRIMARY_KEY_FRAGMENT};
pub use temporal::Timestamp;

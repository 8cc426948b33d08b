//! # credence-crypto: Cryptographic Primitives
//!
//! - **Ed25519** key generation, signing, and verification. Signing input is
//!   always `&CanonicalBytes`.
//! - **did:key** derivation: the DID is a pure function of the public key,
//!   and the public key can be recovered from the DID.
//! - **Key custody**: the `Put`/`Get` contract for private key material,
//!   addressed by `secret/data/dids/<did>`, with an in-memory backend and a
//!   Vault KV v2 HTTP backend.
//!
//! ## Crate Policy
//!
//! - Depends only on `credence-core` internally.
//! - No mocking of cryptographic operations in tests.
//! - Private key bytes are zeroized on drop and never appear in `Debug`.

pub mod custody;
pub mod did_key;
pub mod ed25519;

pub use custody::{
    ConfigError, KeyCustody, KeyCustodyError, MemoryKeyCustody, SecretMap, VaultConfig,
    VaultKeyCustody,
};
pub use did_key::{did_from_public_key, public_key_from_did};
pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

//! # Key Custody
//!
//! Private keys never live next to public data. Every DID's signing key is
//! held by a custody backend under the path
//!
//! ```text
//! <mount>/data/dids/<did>        (mount defaults to "secret")
//! ```
//!
//! as a secret map `{"private_key": "<base64 32-byte seed>"}`.
//!
//! The contract is deliberately narrow: `put(path, map)`, `get(path)`, and
//! `delete(path)`. [`KeyCustody`] dispatches to one of two backends:
//!
//! - [`MemoryKeyCustody`] for development and tests.
//! - [`VaultKeyCustody`] for a HashiCorp Vault KV v2 engine over HTTP.
//!
//! Every failure is a hard error. Callers must never fall back to a default
//! key or sign with a missing one.

mod error;
mod memory;
mod vault;

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use credence_core::Did;
use zeroize::{Zeroize, Zeroizing};

use crate::did_key::did_from_public_key;
use crate::ed25519::Ed25519KeyPair;

pub use error::{ConfigError, KeyCustodyError};
pub use memory::MemoryKeyCustody;
pub use vault::{VaultConfig, VaultKeyCustody};

/// String-to-string secret payload stored at a custody path.
pub type SecretMap = BTreeMap<String, String>;

/// Field of the secret map holding the base64-encoded private key seed.
pub const PRIVATE_KEY_FIELD: &str = "private_key";

/// Default KV v2 mount.
pub const DEFAULT_MOUNT: &str = "secret";

/// Build the custody path for a DID under the given mount.
pub fn did_secret_path(mount: &str, did: &Did) -> String {
    format!("{mount}/data/dids/{did}")
}

/// A key custody backend.
#[derive(Debug, Clone)]
pub enum KeyCustody {
    /// Process-local map. Keys are lost on restart.
    Memory(MemoryKeyCustody),
    /// HashiCorp Vault KV v2.
    Vault(VaultKeyCustody),
}

impl KeyCustody {
    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Vault(_) => "vault",
        }
    }

    /// The custody path for a DID on this backend.
    pub fn path_for(&self, did: &Did) -> String {
        let mount = match self {
            Self::Memory(m) => m.mount(),
            Self::Vault(v) => v.mount(),
        };
        did_secret_path(mount, did)
    }

    /// Store a secret map at `path`, replacing any previous value.
    pub async fn put(&self, path: &str, secret: &SecretMap) -> Result<(), KeyCustodyError> {
        match self {
            Self::Memory(m) => {
                m.put(path, secret);
                Ok(())
            }
            Self::Vault(v) => v.put(path, secret).await,
        }
    }

    /// Fetch the secret map at `path`. `Ok(None)` when nothing is stored.
    pub async fn get(&self, path: &str) -> Result<Option<SecretMap>, KeyCustodyError> {
        match self {
            Self::Memory(m) => Ok(m.get(path)),
            Self::Vault(v) => v.get(path).await,
        }
    }

    /// Remove the secret at `path`. Removing an absent path is not an error.
    pub async fn delete(&self, path: &str) -> Result<(), KeyCustodyError> {
        match self {
            Self::Memory(m) => {
                m.delete(path);
                Ok(())
            }
            Self::Vault(v) => v.delete(path).await,
        }
    }

    /// Register the private key for `did`.
    pub async fn store_signing_key(
        &self,
        did: &Did,
        key: &Ed25519KeyPair,
    ) -> Result<(), KeyCustodyError> {
        let seed = key.secret_bytes();
        let encoded = Zeroizing::new(BASE64.encode(&*seed));
        let mut secret = SecretMap::new();
        secret.insert(PRIVATE_KEY_FIELD.to_string(), encoded.to_string());
        let path = self.path_for(did);
        let result = self.put(&path, &secret).await;
        wipe(&mut secret);
        if result.is_ok() {
            tracing::debug!(%did, backend = self.backend_name(), "stored signing key");
        }
        result
    }

    /// Load the private key for `did`.
    ///
    /// # Errors
    ///
    /// - [`KeyCustodyError::NotFound`] when nothing is stored for the DID.
    /// - [`KeyCustodyError::MalformedSecret`] when the map lacks a decodable
    ///   32-byte `private_key`.
    /// - [`KeyCustodyError::KeyMismatch`] when the stored key does not
    ///   re-derive `did`.
    /// - Transport errors from the backend.
    pub async fn load_signing_key(&self, did: &Did) -> Result<Ed25519KeyPair, KeyCustodyError> {
        let path = self.path_for(did);
        let mut secret = self
            .get(&path)
            .await?
            .ok_or_else(|| KeyCustodyError::NotFound { did: did.to_string() })?;

        let parsed = parse_private_key(&secret);
        wipe(&mut secret);
        let key = parsed?;

        let derived = did_from_public_key(&key.public_key())
            .map_err(|e| KeyCustodyError::MalformedSecret(e.to_string()))?;
        if &derived != did {
            return Err(KeyCustodyError::KeyMismatch { did: did.to_string() });
        }
        Ok(key)
    }
}

fn parse_private_key(secret: &SecretMap) -> Result<Ed25519KeyPair, KeyCustodyError> {
    let encoded = secret.get(PRIVATE_KEY_FIELD).ok_or_else(|| {
        KeyCustodyError::MalformedSecret(format!("missing \"{PRIVATE_KEY_FIELD}\" field"))
    })?;
    let bytes = Zeroizing::new(
        BASE64
            .decode(encoded)
            .map_err(|e| KeyCustodyError::MalformedSecret(format!("invalid base64: {e}")))?,
    );
    Ed25519KeyPair::from_secret_slice(&bytes)
        .map_err(|e| KeyCustodyError::MalformedSecret(e.to_string()))
}

pub(super) fn wipe(secret: &mut SecretMap) {
    for value in secret.values_mut() {
        value.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did_for(kp: &Ed25519KeyPair) -> Did {
        did_from_public_key(&kp.public_key()).unwrap()
    }

    #[test]
    fn path_convention() {
        let did = Did::new("did:key:zABC").unwrap();
        assert_eq!(did_secret_path(DEFAULT_MOUNT, &did), "secret/data/dids/did:key:zABC");
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        assert_eq!(custody.path_for(&did), "secret/data/dids/did:key:zABC");
    }

    #[tokio::test]
    async fn store_then_load_round_trips() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let kp = Ed25519KeyPair::generate().unwrap();
        let did = did_for(&kp);

        custody.store_signing_key(&did, &kp).await.unwrap();
        let loaded = custody.load_signing_key(&did).await.unwrap();
        assert_eq!(loaded.public_key(), kp.public_key());
    }

    #[tokio::test]
    async fn stored_map_uses_private_key_field() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let kp = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let did = did_for(&kp);
        custody.store_signing_key(&did, &kp).await.unwrap();

        let map = custody.get(&custody.path_for(&did)).await.unwrap().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[PRIVATE_KEY_FIELD], BASE64.encode([3u8; 32]));
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let did = did_for(&Ed25519KeyPair::generate().unwrap());
        assert!(matches!(
            custody.load_signing_key(&did).await,
            Err(KeyCustodyError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn key_for_other_did_is_mismatch() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let owner = Ed25519KeyPair::generate().unwrap();
        let intruder = Ed25519KeyPair::generate().unwrap();
        let did = did_for(&owner);
        custody.store_signing_key(&did, &intruder).await.unwrap();

        assert!(matches!(
            custody.load_signing_key(&did).await,
            Err(KeyCustodyError::KeyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_secret_rejected() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let did = did_for(&Ed25519KeyPair::generate().unwrap());
        let path = custody.path_for(&did);

        let mut secret = SecretMap::new();
        secret.insert("wrong_field".into(), "x".into());
        custody.put(&path, &secret).await.unwrap();
        assert!(matches!(
            custody.load_signing_key(&did).await,
            Err(KeyCustodyError::MalformedSecret(_))
        ));

        secret.clear();
        secret.insert(PRIVATE_KEY_FIELD.into(), BASE64.encode([1u8; 16]));
        custody.put(&path, &secret).await.unwrap();
        assert!(matches!(
            custody.load_signing_key(&did).await,
            Err(KeyCustodyError::MalformedSecret(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let custody = KeyCustody::Memory(MemoryKeyCustody::new());
        let kp = Ed25519KeyPair::generate().unwrap();
        let did = did_for(&kp);
        custody.store_signing_key(&did, &kp).await.unwrap();
        custody.delete(&custody.path_for(&did)).await.unwrap();
        assert!(custody.get(&custody.path_for(&did)).await.unwrap().is_none());
        custody.delete(&custody.path_for(&did)).await.unwrap();
    }
}

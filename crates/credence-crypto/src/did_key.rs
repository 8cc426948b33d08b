//! # did:key Derivation
//!
//! A `did:key` identifier is the multibase encoding of the public key itself:
//!
//! ```text
//! did:key:z + base58btc(0xed 0x01 ‖ public_key)
//! ```
//!
//! The DID is therefore self-certifying. Anyone holding the DID document can
//! re-derive the DID from `publicKey` and detect a document that was paired
//! with the wrong key.

use credence_core::{CryptoError, Did};

use crate::ed25519::Ed25519PublicKey;

/// The DID method produced by [`did_from_public_key`].
pub const DID_KEY_METHOD: &str = "key";

/// Derive the `did:key` identifier for a public key.
pub fn did_from_public_key(public_key: &Ed25519PublicKey) -> Result<Did, CryptoError> {
    Did::new(format!("did:{DID_KEY_METHOD}:{}", public_key.to_multibase()))
        .map_err(|e| CryptoError::KeyError(e.to_string()))
}

/// Recover the public key encoded in a `did:key` identifier.
///
/// # Errors
///
/// Returns [`CryptoError::KeyError`] for a non-`key` method, or the decoding
/// error from [`Ed25519PublicKey::from_multibase`].
pub fn public_key_from_did(did: &Did) -> Result<Ed25519PublicKey, CryptoError> {
    if did.method() != DID_KEY_METHOD {
        return Err(CryptoError::KeyError(format!(
            "cannot decode a public key from did:{} identifiers",
            did.method()
        )));
    }
    Ed25519PublicKey::from_multibase(did.method_specific_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::Ed25519KeyPair;

    #[test]
    fn derived_did_has_expected_shape() {
        let kp = Ed25519KeyPair::generate().unwrap();
        let did = did_from_public_key(&kp.public_key()).unwrap();
        assert_eq!(did.method(), "key");
        assert!(did.as_str().starts_with("did:key:z6Mk"));
    }

    #[test]
    fn did_round_trips_to_public_key() {
        let kp = Ed25519KeyPair::generate().unwrap();
        let did = did_from_public_key(&kp.public_key()).unwrap();
        assert_eq!(public_key_from_did(&did).unwrap(), kp.public_key());
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[9u8; 32]);
        assert_eq!(
            did_from_public_key(&a.public_key()).unwrap(),
            did_from_public_key(&b.public_key()).unwrap()
        );
    }

    #[test]
    fn distinct_keys_give_distinct_dids() {
        let a = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[2u8; 32]);
        assert_ne!(
            did_from_public_key(&a.public_key()).unwrap(),
            did_from_public_key(&b.public_key()).unwrap()
        );
    }

    #[test]
    fn other_methods_rejected() {
        let did = Did::new("did:web:example.com").unwrap();
        assert!(matches!(public_key_from_did(&did), Err(CryptoError::KeyError(_))));
    }

    #[test]
    fn garbage_key_material_rejected() {
        let did = Did::new("did:key:zABC").unwrap();
        assert!(public_key_from_did(&did).is_err());
    }
}

//! # Ed25519 Signing and Verification
//!
//! Key generation, signing, and verification for credential and
//! presentation proofs.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. Raw byte slices cannot be
//!   signed, so every proof covers the JCS form of its document.
//! - `Ed25519KeyPair` does not implement `Serialize`. Secret bytes leave the
//!   type only through [`Ed25519KeyPair::secret_bytes`], wrapped in
//!   `Zeroizing` so the copy is wiped on drop.
//! - Verification uses `verify_strict`, rejecting small-order public keys and
//!   non-canonical signature encodings.
//!
//! ## Encodings
//!
//! - Public keys render as multibase base58btc with the Ed25519 multicodec
//!   prefix (`z6Mk…`), the form used inside DID documents.
//! - Signatures render as standard base64, the form used in `proofValue`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use credence_core::{CanonicalBytes, CryptoError};
use ed25519_dalek::Signer;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, Zeroizing};

/// Multicodec varint for an Ed25519 public key (`0xed`).
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Multibase prefix for base58btc.
const MULTIBASE_BASE58BTC: char = 'z';

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a public key from a byte slice of length 32.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::KeyError(format!("public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as multibase base58btc over `0xed01 ‖ key`.
    pub fn to_multibase(&self) -> String {
        let mut prefixed = Vec::with_capacity(ED25519_MULTICODEC.len() + 32);
        prefixed.extend_from_slice(&ED25519_MULTICODEC);
        prefixed.extend_from_slice(&self.0);
        format!("{MULTIBASE_BASE58BTC}{}", bs58::encode(prefixed).into_string())
    }

    /// Parse a multibase base58btc string carrying the Ed25519 multicodec.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encoding`] for a wrong multibase prefix or bad
    /// base58, and [`CryptoError::KeyError`] for a wrong multicodec or length.
    pub fn from_multibase(s: &str) -> Result<Self, CryptoError> {
        let encoded = s.strip_prefix(MULTIBASE_BASE58BTC).ok_or_else(|| {
            CryptoError::Encoding(format!("expected multibase base58btc ('z') prefix: {s:?}"))
        })?;
        let decoded = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::Encoding(format!("invalid base58btc: {e}")))?;
        let key = decoded.strip_prefix(&ED25519_MULTICODEC[..]).ok_or_else(|| {
            CryptoError::KeyError("multicodec prefix is not ed25519-pub (0xed01)".to_string())
        })?;
        Self::from_slice(key)
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_multibase())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_multibase(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({})", self.to_multibase())
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_multibase())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as standard (padded) base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Parse a standard base64 signature.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CryptoError::Encoding(format!("invalid base64 signature: {e}")))?;
        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::VerificationFailed(format!(
                "signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b64 = self.to_base64();
        write!(f, "Ed25519Signature({}...)", &b64[..12])
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new key pair from the OS randomness source.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyError`] if the OS RNG is unavailable.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CryptoError::KeyError(format!("randomness source failed: {e}")))?;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok(Self { signing_key })
    }

    /// Create a key pair from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Create a key pair from secret bytes of unchecked length.
    pub fn from_secret_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(bytes.try_into().map_err(|_| {
            CryptoError::KeyError(format!("private key must be 32 bytes, got {}", bytes.len()))
        })?);
        Ok(Self::from_seed(&seed))
    }

    /// Copy out the 32-byte secret seed. The copy is wiped on drop.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        let sig = self.signing_key.sign(data.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over canonical bytes.
///
/// Returns `Ok(())` if valid, `Err(CryptoError::VerificationFailed)` otherwise.
pub fn verify(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify_strict(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_seed_signs_and_verifies(seed in any::<[u8; 32]>(), claim in "[a-zA-Z0-9 ]{0,64}") {
            let kp = Ed25519KeyPair::from_seed(&seed);
            let data = CanonicalBytes::new(&serde_json::json!({"claim": claim})).unwrap();
            let sig = kp.sign(&data);
            prop_assert!(verify(&data, &sig, &kp.public_key()).is_ok());
        }

        #[test]
        fn multibase_round_trips(bytes in any::<[u8; 32]>()) {
            let pk = Ed25519PublicKey::from_bytes(bytes);
            prop_assert_eq!(Ed25519PublicKey::from_multibase(&pk.to_multibase()).unwrap(), pk);
        }
    }
}

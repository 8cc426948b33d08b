//! # Identity Newtypes
//!
//! `Did` plus the identifier types for credentials and presentations. The
//! distinct types prevent passing a presentation id where a credential id is
//! expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Fragment of the single verification method every Credence DID carries.
pub const PRIMARY_KEY_FRAGMENT: &str = "keys-1";

const URN_UUID_PREFIX: &str = "urn:uuid:";

/// A W3C Decentralized Identifier, validated at construction.
///
/// # Validation
///
/// - Starts with `did:`
/// - Method is non-empty lowercase alphanumeric
/// - Method-specific identifier is non-empty and contains no `#`, `?`, or `/`
///
/// Reference: <https://www.w3.org/TR/did-core/#did-syntax>
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// `did:<method>:<identifier>`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let invalid = || ValidationError::InvalidDid(s.to_string());
        let rest = s.strip_prefix("did:").ok_or_else(invalid)?;
        let (method, identifier) = rest.split_once(':').ok_or_else(invalid)?;

        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if identifier.is_empty() || identifier.contains(['#', '?', '/']) {
            return Err(invalid());
        }
        Ok(())
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (e.g. `key`).
    pub fn method(&self) -> &str {
        self.parts().0
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        self.parts().1
    }

    fn parts(&self) -> (&str, &str) {
        self.0
            .strip_prefix("did:")
            .and_then(|rest| rest.split_once(':'))
            .unwrap_or(("", ""))
    }

    /// The DID URL of this identity's signing key: `<did>#keys-1`.
    pub fn verification_method(&self) -> String {
        format!("{}#{}", self.0, PRIMARY_KEY_FRAGMENT)
    }

    /// Split a `<did>#<fragment>` DID URL into its DID and fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidVerificationMethod`] when the
    /// fragment is missing or empty, or [`ValidationError::InvalidDid`] when
    /// the DID part is malformed.
    pub fn from_verification_method(vm: &str) -> Result<(Self, String), ValidationError> {
        let (did, fragment) = vm
            .split_once('#')
            .filter(|(_, f)| !f.is_empty())
            .ok_or_else(|| ValidationError::InvalidVerificationMethod(vm.to_string()))?;
        Ok((Self::new(did)?, fragment.to_string()))
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn parse_urn_uuid(s: &str) -> Result<Uuid, ValidationError> {
    let raw = s.strip_prefix(URN_UUID_PREFIX).unwrap_or(s);
    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidIdentifier(s.to_string()))
}

/// Unique identifier of a Verifiable Credential, rendered `urn:uuid:<v4>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Generate a fresh random credential id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse `urn:uuid:<uuid>` or a bare UUID.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        parse_urn_uuid(s).map(Self)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{URN_UUID_PREFIX}{}", self.0)
    }
}

impl TryFrom<String> for CredentialId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CredentialId> for String {
    fn from(id: CredentialId) -> Self {
        id.to_string()
    }
}

/// Unique identifier of a stored Verifiable Presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PresentationId(Uuid);

impl PresentationId {
    /// Generate a fresh random presentation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse `urn:uuid:<uuid>` or a bare UUID.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        parse_urn_uuid(s).map(Self)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PresentationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PresentationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{URN_UUID_PREFIX}{}", self.0)
    }
}

impl TryFrom<String> for PresentationId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PresentationId> for String {
    fn from(id: PresentationId) -> Self {
        id.to_string()
    }
}

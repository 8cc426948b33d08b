//! Errors raised by key custody backends.

/// Errors from key custody operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyCustodyError {
    /// No key is registered for the DID.
    #[error("no signing key registered for {did}")]
    NotFound { did: String },

    /// The stored key does not belong to the DID it is filed under.
    #[error("stored signing key does not derive {did}")]
    KeyMismatch { did: String },

    /// The stored secret map is missing or has an undecodable `private_key`.
    #[error("malformed custody secret: {0}")]
    MalformedSecret(String),

    /// Transport failure (connect, timeout, TLS).
    #[error("custody request {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("custody backend returned {status} for {endpoint}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The backend answered with a body that does not match the KV v2 shape.
    #[error("failed to decode custody response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Client configuration is invalid.
    #[error("custody configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl KeyCustodyError {
    /// Whether the failure was transient (timeout, connect, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Configuration errors for the Vault backend.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("VAULT_ADDR environment variable is not set")]
    MissingAddr,
    #[error("VAULT_TOKEN environment variable is required when VAULT_ADDR is set")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

//! # Application State
//!
//! Shared state handed to every handler through the `State` extractor.
//!
//! - **DID documents**, keyed by DID. This is the resolver's view.
//! - **Credentials**, keyed by credential UUID, with revocation tombstones.
//! - **Holdings**: which holder has received which credential.
//! - **Presentations** with the outcome of their in-process verification.
//! - **Key custody**: where private keys live.
//!
//! In-memory stores are the read path. When a Postgres pool is configured,
//! every write goes to the database first and the stores are hydrated from
//! it at start-up.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use credence_core::{CredentialId, Did, Timestamp};
use credence_crypto::{
    ConfigError as CustodyConfigError, Ed25519PublicKey, KeyCustody, KeyCustodyError,
    MemoryKeyCustody, VaultConfig, VaultKeyCustody,
};
use credence_vc::{
    DidDocument, KeyResolver, RevocationLookup, RevocationState, VerifiableCredential,
    VerifiablePresentation, VerificationOutcome, Verifier,
};

use crate::error::AppError;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across an `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync, K: Eq + Hash + Clone = Uuid> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<T: Clone + Send + Sync, K: Eq + Hash + Clone> Clone for Store<T, K> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync, K: Eq + Hash + Clone> Store<T, K> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert only when the key is free. Returns `false` if it was taken.
    pub fn insert_new(&self, id: K, value: T) -> bool {
        let mut guard = self.data.write();
        if guard.contains_key(&id) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    pub fn get(&self, id: &K) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// All records matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    /// Atomically read-validate-update a record under one write lock.
    ///
    /// Returns `None` if the record doesn't exist, otherwise the closure's
    /// result.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync, K: Eq + Hash + Clone> Default for Store<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

/// An issued credential and its revocation status.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub issuer: Did,
    /// `credentialSubject.id`, when it is a DID.
    #[schema(value_type = Option<String>)]
    pub subject: Option<Did>,
    #[schema(value_type = Object)]
    pub credential: VerifiableCredential,
    #[schema(value_type = String)]
    pub issued_at: Timestamp,
    #[schema(value_type = String)]
    pub expires_at: Timestamp,
    pub revoked: bool,
    #[schema(value_type = Option<String>)]
    pub revoked_at: Option<Timestamp>,
}

impl CredentialRecord {
    /// Record for a freshly signed credential.
    pub fn issued(id: CredentialId, credential: VerifiableCredential) -> Result<Self, AppError> {
        Ok(Self {
            id: *id.as_uuid(),
            issuer: credential.issuer.clone(),
            subject: credential.subject_did(),
            issued_at: credential.issued_at()?,
            expires_at: credential.expires_at()?,
            credential,
            revoked: false,
            revoked_at: None,
        })
    }
}

/// A credential in a holder's wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolderCredentialRecord {
    #[schema(value_type = String)]
    pub holder: Did,
    pub credential_id: Uuid,
    #[schema(value_type = String)]
    pub received_at: Timestamp,
}

/// Key of the holdings store: one entry per (holder, credential) pair.
pub type HoldingKey = (Did, Uuid);

/// A signed presentation and the verdict reached when it was submitted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRecord {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub holder: Did,
    #[schema(value_type = Object)]
    pub presentation: VerifiablePresentation,
    #[schema(value_type = Object)]
    pub verification: VerificationOutcome,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
}

// -- Lookups used by the verifier ---------------------------------------------

impl KeyResolver for Store<DidDocument, Did> {
    fn resolve_key(&self, did: &Did) -> Option<Ed25519PublicKey> {
        self.get(did).map(|doc| doc.public_key)
    }
}

impl RevocationLookup for Store<CredentialRecord> {
    fn status(&self, credential_id: &str) -> RevocationState {
        let Ok(id) = CredentialId::parse(credential_id) else {
            return RevocationState::Unknown;
        };
        match self.get(id.as_uuid()) {
            None => RevocationState::Unknown,
            Some(CredentialRecord {
                revoked: true,
                revoked_at: Some(revoked_at),
                ..
            }) => RevocationState::Revoked { revoked_at },
            // A revoked flag without a timestamp is still revoked.
            Some(CredentialRecord { revoked: true, .. }) => RevocationState::Revoked {
                revoked_at: Timestamp::now(),
            },
            Some(_) => RevocationState::Active,
        }
    }
}

// -- Configuration ------------------------------------------------------------

/// Start-up configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Days between `issuanceDate` and `expirationDate`.
    pub credential_validity_days: u32,
    /// Organization recorded on DID documents when the request names none.
    pub default_organization_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            credential_validity_days: 365,
            default_organization_id: "default-org".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `CREDENTIAL_VALIDITY_DAYS` and `DEFAULT_ORGANIZATION_ID`.
    ///
    /// Unset variables take their defaults; set but unparseable ones are an
    /// error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_env("PORT", defaults.port)?,
            credential_validity_days: parse_env(
                "CREDENTIAL_VALIDITY_DAYS",
                defaults.credential_validity_days,
            )?,
            default_organization_id: std::env::var("DEFAULT_ORGANIZATION_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_organization_id),
        })
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Build the key custody backend from the environment.
///
/// Vault when `VAULT_ADDR` is set, otherwise the in-memory backend with a
/// warning. A set but invalid Vault configuration is an error.
pub fn custody_from_env() -> Result<KeyCustody, KeyCustodyError> {
    match VaultConfig::from_env() {
        Ok(config) => {
            tracing::info!(addr = %config.addr, mount = %config.mount, "using Vault key custody");
            Ok(KeyCustody::Vault(VaultKeyCustody::new(config)?))
        }
        Err(CustodyConfigError::MissingAddr) => {
            tracing::warn!(
                "VAULT_ADDR not set, private keys are held in process memory and \
                 will not survive restarts"
            );
            Ok(KeyCustody::Memory(MemoryKeyCustody::new()))
        }
        Err(e) => Err(e.into()),
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dids: Store<DidDocument, Did>,
    pub credentials: Store<CredentialRecord>,
    pub holdings: Store<HolderCredentialRecord, HoldingKey>,
    pub presentations: Store<PresentationRecord>,

    pub custody: KeyCustody,

    /// When `Some`, every write is persisted before it becomes visible.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, custody: KeyCustody, db_pool: Option<PgPool>) -> Self {
        Self {
            dids: Store::new(),
            credentials: Store::new(),
            holdings: Store::new(),
            presentations: Store::new(),
            custody,
            db_pool,
            config,
        }
    }

    /// Default configuration, in-memory custody, no database.
    pub fn in_memory() -> Self {
        Self::new(
            AppConfig::default(),
            KeyCustody::Memory(MemoryKeyCustody::new()),
            None,
        )
    }

    /// A verifier reading keys from the DID registry and revocation status
    /// from the credential store, as of now.
    pub fn verifier(&self) -> Verifier<'_, Store<DidDocument, Did>, Store<CredentialRecord>> {
        Verifier::new(&self.dids, &self.credentials)
    }

    /// Load every persisted record into the in-memory stores.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db_pool else {
            return Ok(());
        };

        let documents = crate::db::did_documents::load_all(pool).await?;
        let did_count = documents.len();
        for doc in documents {
            self.dids.insert(doc.id.clone(), doc);
        }

        let credentials = crate::db::credentials::load_all(pool).await?;
        let credential_count = credentials.len();
        for record in credentials {
            self.credentials.insert(record.id, record);
        }

        let holdings = crate::db::holder_credentials::load_all(pool).await?;
        let holding_count = holdings.len();
        for record in holdings {
            self.holdings
                .insert((record.holder.clone(), record.credential_id), record);
        }

        let presentations = crate::db::presentations::load_all(pool).await?;
        let presentation_count = presentations.len();
        for record in presentations {
            self.presentations.insert(record.id, record);
        }

        tracing::info!(
            dids = did_count,
            credentials = credential_count,
            holdings = holding_count,
            presentations = presentation_count,
            "hydrated in-memory stores from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

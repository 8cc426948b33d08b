//! In-process custody backend.
//!
//! Secrets live in a shared map behind a lock. Values are zeroized when an
//! entry is deleted, when `put` replaces it, and when the last handle to the
//! store is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{wipe, SecretMap, DEFAULT_MOUNT};

/// Path-keyed secrets. Wipes every value on drop.
#[derive(Default)]
struct SecretTable(HashMap<String, SecretMap>);

impl SecretTable {
    /// Store `secret` at `path`, returning the wiped previous entry if any.
    fn insert(&mut self, path: &str, secret: SecretMap) -> Option<SecretMap> {
        let mut previous = self.0.insert(path.to_string(), secret)?;
        wipe(&mut previous);
        Some(previous)
    }

    /// Remove the entry at `path`, returning it wiped.
    fn evict(&mut self, path: &str) -> Option<SecretMap> {
        let mut removed = self.0.remove(path)?;
        wipe(&mut removed);
        Some(removed)
    }

    fn wipe_all(&mut self) {
        for secret in self.0.values_mut() {
            wipe(secret);
        }
    }
}

impl Drop for SecretTable {
    fn drop(&mut self) {
        self.wipe_all();
    }
}

/// In-process custody backend.
///
/// Cloning shares the underlying map. The lock is never held across an
/// `.await`.
#[derive(Clone)]
pub struct MemoryKeyCustody {
    secrets: Arc<RwLock<SecretTable>>,
    mount: String,
}

impl MemoryKeyCustody {
    /// Empty store under the default `secret` mount.
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(RwLock::new(SecretTable::default())),
            mount: DEFAULT_MOUNT.to_string(),
        }
    }

    pub(crate) fn mount(&self) -> &str {
        &self.mount
    }

    pub(crate) fn put(&self, path: &str, secret: &SecretMap) {
        self.secrets.write().insert(path, secret.clone());
    }

    pub(crate) fn get(&self, path: &str) -> Option<SecretMap> {
        self.secrets.read().0.get(path).cloned()
    }

    pub(crate) fn delete(&self, path: &str) {
        self.secrets.write().evict(path);
    }

    /// Number of stored secrets.
    pub fn len(&self) -> usize {
        self.secrets.read().0.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.secrets.read().0.is_empty()
    }
}

impl Default for MemoryKeyCustody {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryKeyCustody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyCustody")
            .field("mount", &self.mount)
            .field("entries", &self.len())
            .finish()
    }
}

//! Provider configuration and secret lookup.
//!
//! The credential resolver reads two kinds of objects it does not own: the
//! provider configuration (which project to act in, where its credentials
//! live) and the secret holding the credentials. [`ProviderStore`] is the
//! seam to whatever stores them.

use managed::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Reference from a managed object to its provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderReference {
    /// Provider name.
    pub name: String,
}

impl ProviderReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Location of one key inside a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKeySelector {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

/// Provider configuration: the scope a resource lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name.
    pub name: String,
    /// GCP project id.
    pub project_id: String,
    /// Secret key holding a JSON service account key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret_ref: Option<SecretKeySelector>,
}

/// Raw secret data keyed by entry name.
///
/// `Debug` output lists keys only.
#[derive(Clone, Default)]
pub struct Secret {
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    /// Bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Errors from a [`ProviderStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("{kind} {name:?} not found")]
    NotFound {
        /// Object kind, e.g. "Provider".
        kind: &'static str,
        /// Object name.
        name: String,
    },

    /// The store could not be read.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Read access to provider configurations and secrets.
pub trait ProviderStore: Send + Sync {
    /// Fetch a provider configuration.
    fn get_provider(
        &self,
        ctx: &Context,
        reference: &ProviderReference,
    ) -> Result<ProviderConfig, StoreError>;

    /// Fetch a secret by namespace and name.
    fn get_secret(&self, ctx: &Context, namespace: &str, name: &str)
    -> Result<Secret, StoreError>;
}

/// In-memory store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    providers: Arc<Mutex<HashMap<String, ProviderConfig>>>,
    secrets: Arc<Mutex<HashMap<(String, String), Secret>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a provider configuration.
    pub fn add_provider(&self, provider: ProviderConfig) {
        let mut providers = self.providers.lock().unwrap();
        providers.insert(provider.name.clone(), provider);
    }

    /// Add or replace a secret entry.
    pub fn add_secret_key(&self, namespace: &str, name: &str, key: &str, data: impl Into<Vec<u8>>) {
        let mut secrets = self.secrets.lock().unwrap();
        secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .data
            .insert(key.to_string(), data.into());
    }
}

impl ProviderStore for MemoryStore {
    fn get_provider(
        &self,
        ctx: &Context,
        reference: &ProviderReference,
    ) -> Result<ProviderConfig, StoreError> {
        ctx.check()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let providers = self.providers.lock().unwrap();
        providers
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Provider",
                name: reference.name.clone(),
            })
    }

    fn get_secret(
        &self,
        ctx: &Context,
        namespace: &str,
        name: &str,
    ) -> Result<Secret, StoreError> {
        ctx.check()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let secrets = self.secrets.lock().unwrap();
        secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Secret",
                name: format!("{namespace}/{name}"),
            })
    }
}

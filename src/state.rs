use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use iam::{ServiceAccount, ServiceAccountObservation};
use managed::Condition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

// ============================================================================
// State Structures
// ============================================================================

/// Persisted status of every reconciled resource
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncState {
    /// Last time the state was written
    pub last_updated: DateTime<Utc>,

    /// Status per resource name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

/// Status of a single resource
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    /// Provider-side identity assigned on first reconcile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,

    /// Last time a tick ran for this resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<DateTime<Utc>>,

    /// Fields last reported by the provider
    #[serde(default)]
    pub at_provider: ServiceAccountObservation,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// SyncState Implementation
// ============================================================================

impl SyncState {
    /// Get the state file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(paths::state_dir()?.join("state.toml"))
    }

    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Update the timestamp and write state to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Utc::now();
        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Restore persisted status into a freshly declared object
    ///
    /// A stored external name only applies when the manifest does not set
    /// one.
    pub fn hydrate(&self, sa: &mut ServiceAccount) {
        let Some(stored) = self.resources.get(&sa.metadata.name) else {
            return;
        };
        if sa.metadata.external_name.is_none() {
            sa.metadata.external_name.clone_from(&stored.external_name);
        }
        sa.status.at_provider = stored.at_provider.clone();
        sa.status.conditioned.conditions = stored.conditions.clone();
    }

    /// Record the status of an object after a tick
    pub fn record(&mut self, sa: &ServiceAccount) {
        let entry = self.resources.entry(sa.metadata.name.clone()).or_default();
        entry.external_name.clone_from(&sa.metadata.external_name);
        entry.last_reconciled = Some(Utc::now());
        entry.at_provider = sa.status.at_provider.clone();
        entry.conditions = sa.status.conditioned.conditions.clone();
    }

    /// Forget a resource whose external object is gone or released
    pub fn remove(&mut self, name: &str) -> Option<ResourceState> {
        self.resources.remove(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use managed::ConditionType;

    fn reconciled() -> ServiceAccount {
        let mut sa = ServiceAccount::new("build-bot", "gcp");
        sa.metadata.external_name = Some("build-bot".into());
        sa.status.at_provider.email = "build-bot@proj-1.iam.gserviceaccount.com".into();
        sa.status.at_provider.unique_id = "42".into();
        sa.status
            .conditioned
            .set([Condition::available(), Condition::reconcile_success()]);
        sa
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = SyncState::load(&dir.path().join("state.toml")).unwrap();
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = SyncState::default();
        state.record(&reconciled());
        state.save(&path).unwrap();

        let loaded = SyncState::load(&path).unwrap();
        assert_eq!(loaded.resources, state.resources);
        let entry = &loaded.resources["build-bot"];
        assert_eq!(entry.external_name.as_deref(), Some("build-bot"));
        assert_eq!(entry.at_provider.unique_id, "42");
        assert_eq!(entry.conditions.len(), 2);
    }

    #[test]
    fn test_hydrate_restores_status() {
        let mut state = SyncState::default();
        state.record(&reconciled());

        let mut fresh = ServiceAccount::new("build-bot", "gcp");
        state.hydrate(&mut fresh);

        assert_eq!(fresh.external_name(), "build-bot");
        assert_eq!(fresh.status.at_provider.unique_id, "42");
        assert!(fresh.status.conditioned.is_true(ConditionType::Ready));
    }

    #[test]
    fn test_hydrate_keeps_declared_external_name() {
        let mut state = SyncState::default();
        state.record(&reconciled());

        let mut fresh = ServiceAccount::new("build-bot", "gcp");
        fresh.metadata.external_name = Some("renamed".into());
        state.hydrate(&mut fresh);

        assert_eq!(fresh.external_name(), "renamed");
    }

    #[test]
    fn test_hydrate_unknown_resource_is_noop() {
        let state = SyncState::default();
        let mut fresh = ServiceAccount::new("other", "gcp");
        state.hydrate(&mut fresh);
        assert_eq!(fresh, ServiceAccount::new("other", "gcp"));
    }

    #[test]
    fn test_remove() {
        let mut state = SyncState::default();
        state.record(&reconciled());
        assert!(state.remove("build-bot").is_some());
        assert!(state.remove("build-bot").is_none());
    }
}

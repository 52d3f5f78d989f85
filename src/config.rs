//! The declarative manifest (`iamsync.toml`)
//!
//! ```toml
//! secrets_dir = "~/.config/iamsync/secrets"
//!
//! [[providers]]
//! name = "gcp"
//! project_id = "my-project"
//! credentials_secret_ref = { namespace = "default", name = "gcp-creds", key = "key.json" }
//!
//! [[resources]]
//! kind = "ServiceAccount"
//! name = "build-bot"
//! provider = "gcp"
//! display_name = "Build bot"
//! ```

use anyhow::{Context, Result, bail};
use iam::{ProviderConfig, ServiceAccount};
use managed::ReclaimPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Default manifest file name inside the config directory
pub const MANIFEST_FILE: &str = "iamsync.toml";

/// Parsed manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Root of the secrets tree; relative paths resolve against the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_dir: Option<String>,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// A managed resource declaration, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceEntry {
    ServiceAccount(ServiceAccountEntry),
}

impl ResourceEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::ServiceAccount(entry) => &entry.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceAccountEntry {
    /// The managed object this entry declares
    pub fn to_managed(&self) -> ServiceAccount {
        let mut sa = ServiceAccount::new(&self.name, &self.provider);
        sa.metadata.external_name.clone_from(&self.external_name);
        sa.spec.reclaim_policy = self.reclaim_policy;
        sa.spec.for_provider.display_name.clone_from(&self.display_name);
        sa.spec.for_provider.description.clone_from(&self.description);
        sa
    }
}

impl Manifest {
    /// Default manifest path (`<config dir>/iamsync.toml`)
    pub fn default_path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(MANIFEST_FILE))
    }

    /// Load and validate a manifest
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;
        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;
        manifest.validate()?;
        log::debug!(
            "Loaded manifest {} ({} providers, {} resources)",
            path.display(),
            manifest.providers.len(),
            manifest.resources.len()
        );
        Ok(manifest)
    }

    /// Reject empty or duplicate names
    ///
    /// Unknown provider references are left to reconciliation, which reports
    /// them per resource.
    pub fn validate(&self) -> Result<()> {
        let mut providers = HashSet::new();
        for provider in &self.providers {
            if provider.name.is_empty() {
                bail!("Provider with empty name");
            }
            if provider.project_id.is_empty() {
                bail!("Provider '{}' has an empty project_id", provider.name);
            }
            if !providers.insert(provider.name.as_str()) {
                bail!("Duplicate provider '{}'", provider.name);
            }
        }

        let mut resources = HashSet::new();
        for resource in &self.resources {
            let name = resource.name();
            if name.is_empty() {
                bail!("Resource with empty name");
            }
            if !resources.insert(name) {
                bail!("Duplicate resource '{name}'");
            }
            let ResourceEntry::ServiceAccount(entry) = resource;
            if entry.external_name.as_deref() == Some("") {
                bail!("Resource '{name}' has an empty external_name");
            }
        }
        Ok(())
    }

    /// Secrets root, resolved against the manifest's directory
    pub fn secrets_dir(&self, manifest_path: &Path) -> PathBuf {
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.secrets_dir {
            Some(dir) => base.join(paths::expand(dir)),
            None => base.join("secrets"),
        }
    }

    /// All declared service accounts, in manifest order
    pub fn service_accounts(&self) -> Vec<ServiceAccount> {
        self.resources
            .iter()
            .map(|resource| match resource {
                ResourceEntry::ServiceAccount(entry) => entry.to_managed(),
            })
            .collect()
    }

    /// Find a declared service account by name
    pub fn service_account(&self, name: &str) -> Option<ServiceAccount> {
        self.resources.iter().find_map(|resource| match resource {
            ResourceEntry::ServiceAccount(entry) if entry.name == name => Some(entry.to_managed()),
            ResourceEntry::ServiceAccount(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
secrets_dir = "creds"

[[providers]]
name = "gcp"
project_id = "proj-1"
credentials_secret_ref = { namespace = "system", name = "gcp-creds", key = "key.json" }

[[providers]]
name = "bare"
project_id = "proj-2"

[[resources]]
kind = "ServiceAccount"
name = "build-bot"
provider = "gcp"
display_name = "Build bot"

[[resources]]
kind = "ServiceAccount"
name = "legacy"
external_name = "legacy-sa"
provider = "bare"
reclaim_policy = "Retain"
description = "kept on removal"
"#;

    fn parse(content: &str) -> Result<Manifest> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse(MANIFEST).unwrap();

        assert_eq!(manifest.providers.len(), 2);
        let selector = manifest.providers[0].credentials_secret_ref.as_ref().unwrap();
        assert_eq!(selector.key, "key.json");
        assert!(manifest.providers[1].credentials_secret_ref.is_none());

        let accounts = manifest.service_accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].metadata.name, "build-bot");
        assert_eq!(accounts[0].metadata.external_name, None);
        assert_eq!(accounts[0].spec.reclaim_policy, ReclaimPolicy::Delete);
        assert_eq!(
            accounts[0].spec.for_provider.display_name.as_deref(),
            Some("Build bot")
        );
        assert_eq!(accounts[0].spec.for_provider.description, None);
        assert_eq!(accounts[1].external_name(), "legacy-sa");
        assert_eq!(accounts[1].spec.reclaim_policy, ReclaimPolicy::Retain);
        assert_eq!(accounts[1].spec.provider_ref.name, "bare");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let content = r#"
[[resources]]
kind = "Bucket"
name = "b"
provider = "gcp"
"#;
        assert!(parse(content).is_err());
    }

    #[test]
    fn test_duplicate_resource_is_rejected() {
        let content = r#"
[[resources]]
kind = "ServiceAccount"
name = "a"
provider = "gcp"

[[resources]]
kind = "ServiceAccount"
name = "a"
provider = "gcp"
"#;
        let err = parse(content).unwrap_err();
        assert!(err.to_string().contains("Duplicate resource 'a'"));
    }

    #[test]
    fn test_empty_external_name_is_rejected() {
        let content = r#"
[[resources]]
kind = "ServiceAccount"
name = "a"
external_name = ""
provider = "gcp"
"#;
        assert!(parse(content).is_err());
    }

    #[test]
    fn test_secrets_dir_resolution() {
        let manifest = parse(MANIFEST).unwrap();
        let path = Path::new("/etc/iamsync/iamsync.toml");
        assert_eq!(manifest.secrets_dir(path), PathBuf::from("/etc/iamsync/creds"));

        let default = Manifest::default();
        assert_eq!(default.secrets_dir(path), PathBuf::from("/etc/iamsync/secrets"));

        let absolute = Manifest {
            secrets_dir: Some("/var/run/secrets".into()),
            ..Manifest::default()
        };
        assert_eq!(absolute.secrets_dir(path), PathBuf::from("/var/run/secrets"));
    }

    #[test]
    fn test_find_service_account() {
        let manifest = parse(MANIFEST).unwrap();
        assert!(manifest.service_account("legacy").is_some());
        assert!(manifest.service_account("missing").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.resources.len(), 2);
        assert!(Manifest::load(&dir.path().join("missing.toml")).is_err());
    }
}

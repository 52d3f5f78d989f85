//! File-backed provider store
//!
//! Providers come from the manifest. Secrets are directories under the
//! secrets root, one file per key, the layout of a mounted Kubernetes
//! secret: `<secrets_dir>/<namespace>/<name>/<key>`.

use iam::{ProviderConfig, ProviderReference, ProviderStore, Secret, StoreError};
use managed::Context;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct FileStore {
    providers: HashMap<String, ProviderConfig>,
    secrets_dir: PathBuf,
}

impl FileStore {
    pub fn new(providers: impl IntoIterator<Item = ProviderConfig>, secrets_dir: PathBuf) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            secrets_dir,
        }
    }
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl ProviderStore for FileStore {
    fn get_provider(
        &self,
        ctx: &Context,
        reference: &ProviderReference,
    ) -> Result<ProviderConfig, StoreError> {
        ctx.check().map_err(unavailable)?;
        self.providers
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Provider",
                name: reference.name.clone(),
            })
    }

    fn get_secret(&self, ctx: &Context, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        ctx.check().map_err(unavailable)?;

        let dir = self.secrets_dir.join(namespace).join(name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    kind: "Secret",
                    name: format!("{namespace}/{name}"),
                });
            }
            Err(e) => return Err(unavailable(format!("{}: {e}", dir.display()))),
        };

        let mut secret = Secret::default();
        for entry in entries {
            let entry = entry.map_err(unavailable)?;
            let key = entry.file_name().to_string_lossy().into_owned();
            // Mounted secrets carry hidden bookkeeping entries (`..data`).
            if key.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let data = fs::read(&path).map_err(|e| unavailable(format!("{}: {e}", path.display())))?;
            secret.data.insert(key, data);
        }
        log::debug!(
            "Read secret {namespace}/{name} ({} keys)",
            secret.data.len()
        );
        Ok(secret)
    }
}

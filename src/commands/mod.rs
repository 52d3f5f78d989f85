//! Command implementations

pub mod delete;
pub mod reconcile;
pub mod status;

use anyhow::Result;
use iam::{Connector, ServiceAccount};
use managed::{ProgressCallback, ReconcileOutcome, Reconciler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Manifest;
use crate::state::SyncState;
use crate::store::FileStore;
use crate::ui;

/// Everything a command needs to reconcile the manifest
pub struct Workspace {
    pub manifest: Manifest,
    pub reconciler: Reconciler<ServiceAccount, Connector>,
    pub state_path: PathBuf,
}

impl Workspace {
    /// Load the manifest (explicit path or the default one) and wire the
    /// reconciler to its providers and secrets
    pub fn load(manifest_path: Option<&Path>) -> Result<Self> {
        let manifest_path = match manifest_path {
            Some(path) => path.to_path_buf(),
            None => Manifest::default_path()?,
        };
        let manifest = Manifest::load(&manifest_path)?;
        let secrets_dir = manifest.secrets_dir(&manifest_path);
        log::debug!("Reading secrets from {}", secrets_dir.display());

        let store = FileStore::new(manifest.providers.iter().cloned(), secrets_dir);
        let reconciler = Reconciler::new(Connector::new(Arc::new(store)));

        Ok(Self {
            manifest,
            reconciler,
            state_path: SyncState::default_path()?,
        })
    }

    /// Declared resources with their persisted status restored
    pub fn resources(&self, state: &SyncState) -> Vec<ServiceAccount> {
        let mut resources = self.manifest.service_accounts();
        for sa in &mut resources {
            state.hydrate(sa);
        }
        resources
    }
}

/// Prints one line per reconciled resource
pub struct TickReporter {
    quiet: bool,
}

impl TickReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressCallback for TickReporter {
    fn on_tick_start(&mut self, count: usize) {
        if !self.quiet {
            ui::info(&format!("Reconciling {count} resource(s)"));
        }
    }

    fn on_resource_complete(&mut self, name: &str, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Failed { error } => {
                ui::error(&format!("{name}: {error}"));
                if !self.quiet {
                    ui::dim(error.category().advice());
                }
            }
            _ if self.quiet => {}
            other if other.is_change() => ui::success(&format!("{name}: {}", other.label())),
            other => ui::dim(&format!("{name}: {}", other.label())),
        }
    }

    fn on_tick_complete(&mut self) {}
}

//! `iamsync delete`: run the removal path for one declared resource

use anyhow::{Result, bail};
use managed::{ReclaimPolicy, ReconcileOutcome};
use std::time::Duration;

use super::Workspace;
use crate::Context;
use crate::cli::DeleteArgs;
use crate::state::SyncState;
use crate::ui;

pub fn run(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    let workspace = Workspace::load(args.manifest.as_deref())?;
    let Some(mut sa) = workspace.manifest.service_account(&args.name) else {
        bail!("Resource '{}' is not declared in the manifest", args.name);
    };

    let mut state = SyncState::load(&workspace.state_path)?;
    state.hydrate(&mut sa);
    sa.metadata.deletion_requested = true;

    let deadline = managed::Context::background().with_timeout(Duration::from_secs(args.timeout));
    let outcome = workspace.reconciler.reconcile(&deadline, &mut sa);

    match outcome {
        ReconcileOutcome::Deleted | ReconcileOutcome::Released => {
            state.remove(&args.name);
            state.save(&workspace.state_path)?;
            if sa.spec.reclaim_policy == ReclaimPolicy::Retain {
                ui::success(&format!(
                    "{}: released (reclaim policy Retain keeps {})",
                    args.name,
                    sa.external_name()
                ));
            } else {
                ui::success(&format!("{}: deleted", args.name));
            }
            if !ctx.quiet {
                ui::warn("The resource is still declared; the next reconcile will recreate it");
            }
            Ok(())
        }
        ReconcileOutcome::Failed { error } => {
            state.record(&sa);
            state.save(&workspace.state_path)?;
            ui::dim(error.category().advice());
            Err(anyhow::Error::new(error).context(format!("Failed to delete '{}'", args.name)))
        }
        other => bail!("Unexpected outcome for '{}': {}", args.name, other.label()),
    }
}

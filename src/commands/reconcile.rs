//! `iamsync reconcile`: one tick over the manifest, or a tick loop with `--watch`

use anyhow::{Result, bail};
use colored::Colorize;
use managed::{ExecuteOptions, ExecuteSummary};
use std::thread;
use std::time::Duration;

use super::{TickReporter, Workspace};
use crate::Context;
use crate::cli::ReconcileArgs;
use crate::state::SyncState;
use crate::ui;

/// Delay before the next tick when an outcome asks to be requeued
const REQUEUE_AFTER: Duration = Duration::from_secs(5);

pub fn run(ctx: &Context, args: &ReconcileArgs) -> Result<()> {
    let workspace = Workspace::load(args.manifest.as_deref())?;
    let opts = ExecuteOptions {
        jobs: args.jobs.max(1),
        timeout: Some(Duration::from_secs(args.timeout)),
    };

    if !args.watch {
        let (summary, _) = tick(ctx, &workspace, &opts)?;
        if !summary.is_success() {
            bail!("{} resource(s) failed to reconcile", summary.failed);
        }
        return Ok(());
    }

    let interval = Duration::from_secs(args.interval.max(1));
    if !ctx.quiet {
        ui::info(&format!(
            "Watching {} resource(s) every {}",
            workspace.manifest.resources.len(),
            ui::format_secs(interval.as_secs())
        ));
    }
    loop {
        // A failed tick is reported and retried; only state I/O errors stop the loop.
        let (_, requeue) = tick(ctx, &workspace, &opts)?;
        let wait = if requeue {
            REQUEUE_AFTER.min(interval)
        } else {
            interval
        };
        log::debug!("Next tick in {}s", wait.as_secs());
        thread::sleep(wait);
    }
}

/// Run one tick and persist status; returns whether any resource wants an
/// early requeue
fn tick(ctx: &Context, workspace: &Workspace, opts: &ExecuteOptions) -> Result<(ExecuteSummary, bool)> {
    let mut state = SyncState::load(&workspace.state_path)?;
    let mut resources = workspace.resources(&state);

    let mut reporter = TickReporter::new(ctx.quiet);
    let (summary, outcomes) = managed::execute(
        &workspace.reconciler,
        &managed::Context::background(),
        &mut resources,
        opts,
        &mut reporter,
    )?;

    for sa in &resources {
        state.record(sa);
    }
    state.save(&workspace.state_path)?;

    if !ctx.quiet {
        print_summary(&summary);
    }
    let requeue = outcomes.iter().any(managed::ReconcileOutcome::should_requeue);
    Ok((summary, requeue))
}

fn print_summary(summary: &ExecuteSummary) {
    println!();
    println!(
        "{} {} created, {} updated, {} up to date, {} deleted, {} released, {}",
        "Summary:".bold(),
        summary.created,
        summary.updated,
        summary.up_to_date,
        summary.deleted,
        summary.released,
        if summary.failed > 0 {
            format!("{} failed", summary.failed).red().to_string()
        } else {
            "0 failed".to_string()
        }
    );
}

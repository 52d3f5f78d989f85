//! `iamsync status`: show persisted status

use anyhow::{Context as _, Result};
use colored::Colorize;
use managed::{Condition, ConditionType};

use crate::Context;
use crate::cli::StatusArgs;
use crate::state::{ResourceState, SyncState};
use crate::ui;

pub fn run(ctx: &Context, args: &StatusArgs) -> Result<()> {
    let state = SyncState::load(&SyncState::default_path()?)?;

    if args.json {
        let json = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;
        println!("{json}");
        return Ok(());
    }

    ui::header("Service Accounts");
    if state.resources.is_empty() {
        ui::dim("Nothing reconciled yet");
        return Ok(());
    }

    for (name, resource) in &state.resources {
        print_resource(ctx, name, resource);
    }

    println!();
    ui::dim(&format!(
        "Last updated {}",
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}

fn print_resource(ctx: &Context, name: &str, resource: &ResourceState) {
    let ready = find(resource, ConditionType::Ready);
    let synced = find(resource, ConditionType::Synced);
    let badge = match (ready.is_some_and(|c| c.status), synced.is_some_and(|c| c.status)) {
        (true, true) => "ready".green(),
        (_, false) => "error".red(),
        (false, true) => "pending".yellow(),
    };
    ui::section(&format!("{name} [{badge}]"));

    if let Some(external_name) = &resource.external_name {
        ui::kv("external name", external_name);
    }
    let observed = &resource.at_provider;
    if !observed.name.is_empty() {
        ui::kv("address", &observed.name);
    }
    if !observed.email.is_empty() {
        ui::kv("email", &observed.email);
    }
    if !observed.unique_id.is_empty() {
        ui::kv("unique id", &observed.unique_id);
    }
    if observed.disabled {
        ui::kv("disabled", "yes");
    }

    for condition in &resource.conditions {
        let mut line = format!(
            "{:?}={} ({:?})",
            condition.kind, condition.status, condition.reason
        );
        if let Some(message) = &condition.message {
            line.push_str(&format!(": {message}"));
        }
        if ctx.verbose > 0 {
            line.push_str(&format!(
                " since {}",
                condition.last_transition_time.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        ui::kv("condition", &line);
    }

    if let Some(at) = resource.last_reconciled {
        ui::kv("last reconciled", &at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }
}

fn find(resource: &ResourceState, kind: ConditionType) -> Option<&Condition> {
    resource.conditions.iter().find(|c| c.kind == kind)
}

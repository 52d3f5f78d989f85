use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iamsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile GCP IAM service accounts from a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge every declared resource toward the manifest
    Reconcile(ReconcileArgs),

    /// Remove a resource from the provider (honors its reclaim policy)
    Delete(DeleteArgs),

    /// Show stored status of reconciled resources
    Status(StatusArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ReconcileArgs {
    /// Manifest path (default: <config dir>/iamsync.toml)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Number of resources reconciled in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Per-resource deadline in seconds
    #[arg(short, long, default_value = "60")]
    pub timeout: u64,

    /// Keep reconciling until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between ticks in watch mode
    #[arg(short, long, default_value = "60")]
    pub interval: u64,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Resource name as declared in the manifest
    pub name: String,

    /// Manifest path (default: <config dir>/iamsync.toml)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Deadline in seconds
    #[arg(short, long, default_value = "60")]
    pub timeout: u64,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Print the raw state as JSON
    #[arg(long)]
    pub json: bool,
}

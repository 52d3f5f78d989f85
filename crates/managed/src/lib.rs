//! # Managed
//!
//! A framework for reconciling managed external resources.
//!
//! A managed object declares what a resource held by an external provider
//! should look like. Each reconciliation tick observes the provider,
//! detects drift, and converges the provider toward the declaration.
//!
//! ## Core Concepts
//!
//! - **Managed**: The locally declared object, with metadata and status conditions
//! - **ExternalConnecter**: Resolves credentials and builds a provider client per tick
//! - **ExternalClient**: Observe / Create / Update / Delete against the provider
//! - **Reconciler**: The state machine driving one tick
//! - **Context**: Deadline and cancellation carried into every provider call
//!
//! ## Example
//!
//! ```ignore
//! use managed::{Context, Reconciler, ReconcileOutcome};
//!
//! let reconciler = Reconciler::new(connecter);
//! let ctx = Context::background().with_timeout(std::time::Duration::from_secs(30));
//!
//! match reconciler.reconcile(&ctx, &mut object) {
//!     ReconcileOutcome::Failed { error } => eprintln!("{error}"),
//!     outcome => println!("{}", outcome.label()),
//! }
//! ```
//!
//! Scheduling is left to the caller: the reconciler runs exactly one tick
//! and never retries. [`execute`] runs one tick over a batch in parallel.

pub mod context;
pub mod error;
pub mod executor;
pub mod reconciler;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{Context, ContextError, NoProgress, ProgressCallback};
pub use error::{BoxError, Error, ErrorCategory, Result};
pub use executor::{PoolError, execute};
pub use reconciler::Reconciler;
pub use resource::{ExternalClient, ExternalConnecter, Managed};
pub use types::{
    Condition, ConditionReason, ConditionType, ConditionedStatus, ExecuteOptions,
    ExecuteSummary, ExternalObservation, ObjectMeta, ReclaimPolicy, ReconcileOutcome,
};

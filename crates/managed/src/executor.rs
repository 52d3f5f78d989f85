//! Tick executor - reconciles a batch of managed objects in parallel
//!
//! This is the scheduler edge of the crate: each object gets its own child
//! context bounded by the per-resource timeout, objects are spread over a
//! rayon pool, and outcomes are logged and summarized.

use crate::context::{Context, ProgressCallback};
use crate::reconciler::Reconciler;
use crate::resource::{ExternalConnecter, Managed};
use crate::types::{ExecuteOptions, ExecuteSummary, ReconcileOutcome};
use rayon::prelude::*;

/// Error building the worker pool
#[derive(Debug, thiserror::Error)]
#[error("failed to create thread pool: {0}")]
pub struct PoolError(#[from] rayon::ThreadPoolBuildError);

/// Run one tick over `resources`
///
/// Each object is reconciled exactly once. Outcomes are returned in the
/// same order as `resources`.
pub fn execute<M, C, P>(
    reconciler: &Reconciler<M, C>,
    ctx: &Context,
    resources: &mut [M],
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<(ExecuteSummary, Vec<ReconcileOutcome>), PoolError>
where
    M: Managed,
    C: ExternalConnecter<M>,
    P: ProgressCallback,
{
    progress.on_tick_start(resources.len());

    let outcomes: Vec<ReconcileOutcome> = if opts.jobs <= 1 || resources.len() <= 1 {
        resources
            .iter_mut()
            .map(|mg| reconcile_one(reconciler, ctx, mg, opts))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.jobs)
            .build()?;
        pool.install(|| {
            resources
                .par_iter_mut()
                .map(|mg| reconcile_one(reconciler, ctx, mg, opts))
                .collect()
        })
    };

    // Progress callbacks are not thread-safe; report after the batch.
    let mut summary = ExecuteSummary::default();
    for (mg, outcome) in resources.iter().zip(&outcomes) {
        summary.add_outcome(outcome);
        progress.on_resource_complete(mg.name(), outcome);
    }
    progress.on_tick_complete();

    Ok((summary, outcomes))
}

fn reconcile_one<M, C>(
    reconciler: &Reconciler<M, C>,
    ctx: &Context,
    mg: &mut M,
    opts: &ExecuteOptions,
) -> ReconcileOutcome
where
    M: Managed,
    C: ExternalConnecter<M>,
{
    let child = match opts.timeout {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx.clone(),
    };

    let outcome = reconciler.reconcile(&child, mg);
    match &outcome {
        ReconcileOutcome::Failed { error } => {
            log::warn!("{}: {} ({})", mg.name(), error, error.category());
        }
        other => log::info!("{}: {}", mg.name(), other.label()),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::reconciler::tests::{FakeProvider, TestResource};
    use crate::types::ExternalObservation;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingProgress {
        started: usize,
        completed: Vec<String>,
        finished: bool,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_tick_start(&mut self, count: usize) {
            self.started = count;
        }

        fn on_resource_complete(&mut self, name: &str, _outcome: &ReconcileOutcome) {
            self.completed.push(name.to_string());
        }

        fn on_tick_complete(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_execute_empty_batch() {
        let reconciler = Reconciler::new(FakeProvider::default());
        let mut resources: Vec<TestResource> = Vec::new();

        let (summary, outcomes) = execute(
            &reconciler,
            &Context::background(),
            &mut resources,
            &ExecuteOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(summary.total(), 0);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_execute_parallel_batch() {
        let provider = FakeProvider::with(ExternalObservation::absent());
        let reconciler = Reconciler::new(provider.clone());
        let mut resources: Vec<TestResource> = (0..8)
            .map(|i| TestResource::named(&format!("svc-{i}")))
            .collect();
        let mut progress = RecordingProgress::default();

        let (summary, outcomes) = execute(
            &reconciler,
            &Context::background(),
            &mut resources,
            &ExecuteOptions {
                jobs: 4,
                timeout: Some(Duration::from_secs(5)),
            },
            &mut progress,
        )
        .unwrap();

        assert_eq!(summary.created, 8);
        assert_eq!(outcomes.len(), 8);
        assert_eq!(progress.started, 8);
        assert_eq!(progress.completed[3], "svc-3");
        assert!(progress.finished);
        // connect + observe + create per resource
        assert_eq!(provider.calls().len(), 24);
    }

    #[test]
    fn test_execute_sequential_counts_failures() {
        let provider = FakeProvider {
            fail_on: Some("update"),
            ..FakeProvider::with(ExternalObservation::present(false))
        };
        let reconciler = Reconciler::new(provider);
        let mut resources = vec![TestResource::named("a"), TestResource::named("b")];

        let (summary, outcomes) = execute(
            &reconciler,
            &Context::background(),
            &mut resources,
            &ExecuteOptions {
                jobs: 1,
                timeout: None,
            },
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(summary.failed, 2);
        assert!(!summary.is_success());
        assert!(outcomes.iter().all(|o| !o.is_success()));
    }
}

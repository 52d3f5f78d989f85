//! Lifecycle reconciler - one tick of Observe, then Create, Update or nothing
//!
//! ```text
//! connect -> observe
//!   absent               -> create
//!   present, up to date  -> nothing
//!   present, drifted     -> update
//! deletion requested     -> delete (or release when retained)
//! ```
//!
//! The reconciler never retries and never logs. Errors are recorded on the
//! object's `Synced` condition and returned in the outcome; the scheduler
//! decides when to run the next tick.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::resource::{ExternalClient, ExternalConnecter, Managed};
use crate::types::{Condition, ReclaimPolicy, ReconcileOutcome};
use std::marker::PhantomData;

/// Steps of a tick, each with the label used when cancellation stops it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Connect,
    Observe,
    Create,
    Update,
    Delete,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Self::Connect => "cannot connect to provider",
            Self::Observe => "cannot observe external resource",
            Self::Create => "cannot create external resource",
            Self::Update => "cannot update external resource",
            Self::Delete => "cannot delete external resource",
        }
    }

    /// Stop before this step if the context is done
    fn checkpoint(self, ctx: &Context) -> Result<()> {
        ctx.check().map_err(|cause| Error::cancelled(self.label(), cause))
    }
}

/// Reconciles managed objects of kind `M` through connecter `C`
pub struct Reconciler<M, C> {
    connecter: C,
    kind: PhantomData<fn(&mut M)>,
}

impl<M, C> Reconciler<M, C>
where
    M: Managed,
    C: ExternalConnecter<M>,
{
    /// Create a reconciler for a single resource kind
    pub fn new(connecter: C) -> Self {
        Self {
            connecter,
            kind: PhantomData,
        }
    }

    /// Run one tick for `mg`
    ///
    /// Status conditions on `mg` are updated in place; the caller persists
    /// the object afterwards.
    pub fn reconcile(&self, ctx: &Context, mg: &mut M) -> ReconcileOutcome {
        match self.try_reconcile(ctx, mg) {
            Ok(outcome) => {
                mg.conditions_mut().set([Condition::reconcile_success()]);
                outcome
            }
            Err(error) => {
                let ready = if mg.meta().deletion_requested {
                    Condition::deleting()
                } else {
                    Condition::unavailable()
                };
                mg.conditions_mut().set([ready]);
                mg.conditions_mut().set([Condition::reconcile_error(&error)]);
                ReconcileOutcome::Failed { error }
            }
        }
    }

    fn try_reconcile(&self, ctx: &Context, mg: &mut M) -> Result<ReconcileOutcome> {
        initialize_external_name(mg);

        if mg.meta().deletion_requested && mg.reclaim_policy() == ReclaimPolicy::Retain {
            return Ok(ReconcileOutcome::Released);
        }

        Step::Connect.checkpoint(ctx)?;
        let client = self.connecter.connect(ctx, mg)?;

        if mg.meta().deletion_requested {
            return finalize(ctx, &*client, mg);
        }

        Step::Observe.checkpoint(ctx)?;
        let observation = client.observe(ctx, mg)?;

        if !observation.resource_exists {
            Step::Create.checkpoint(ctx)?;
            client.create(ctx, mg)?;
            mg.conditions_mut().set([Condition::creating()]);
            return Ok(ReconcileOutcome::Created);
        }

        if observation.resource_up_to_date {
            mg.conditions_mut().set([Condition::available()]);
            return Ok(ReconcileOutcome::UpToDate);
        }

        // Ready again once a later observe finds no drift. Observed status
        // stays as it was before the patch until then.
        mg.conditions_mut().set([Condition::unavailable()]);
        Step::Update.checkpoint(ctx)?;
        client.update(ctx, mg)?;
        Ok(ReconcileOutcome::Updated)
    }
}

fn finalize<M: Managed>(
    ctx: &Context,
    client: &dyn ExternalClient<M>,
    mg: &mut M,
) -> Result<ReconcileOutcome> {
    mg.conditions_mut().set([Condition::deleting()]);
    Step::Delete.checkpoint(ctx)?;
    client.delete(ctx, mg)?;
    Ok(ReconcileOutcome::Deleted)
}

/// Use the object name as external name when none is set
fn initialize_external_name<M: Managed>(mg: &mut M) {
    let meta = mg.meta_mut();
    if meta.external_name().is_empty() {
        meta.external_name = Some(meta.name.clone());
    }
}

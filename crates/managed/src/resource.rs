//! Traits for managed resources and their external clients
//!
//! A managed object is the declarative, locally stored side of a resource.
//! The external resource lives in a provider and is only reachable through
//! an [`ExternalClient`], which an [`ExternalConnecter`] builds for each tick.

use crate::context::Context;
use crate::error::Result;
use crate::types::{ConditionedStatus, ExternalObservation, ObjectMeta, ReclaimPolicy};
use std::fmt;

/// A locally declared object whose external counterpart is reconciled
///
/// Implementors only expose metadata and status; all provider knowledge
/// lives in the connecter and client.
pub trait Managed: Send + Sync + fmt::Debug {
    /// Object identity
    fn meta(&self) -> &ObjectMeta;

    /// Mutable object identity
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Conditions reported on the object's status
    fn conditions(&self) -> &ConditionedStatus;

    /// Mutable conditions
    fn conditions_mut(&mut self) -> &mut ConditionedStatus;

    /// What to do with the external resource on removal
    fn reclaim_policy(&self) -> ReclaimPolicy {
        ReclaimPolicy::Delete
    }

    /// Object name
    fn name(&self) -> &str {
        &self.meta().name
    }
}

/// Builds an [`ExternalClient`] for one managed object
///
/// Connecting resolves credentials and constructs a provider client. It
/// must not return a partially configured client.
pub trait ExternalConnecter<M: Managed>: Send + Sync {
    /// Resolve credentials for `mg` and build a client
    fn connect(&self, ctx: &Context, mg: &M) -> Result<Box<dyn ExternalClient<M>>>;
}

/// Provider operations for one managed resource kind
///
/// A not-found response is a normal outcome for [`observe`](Self::observe)
/// (the resource is absent) and [`delete`](Self::delete) (already gone).
pub trait ExternalClient<M: Managed>: Send {
    /// Fetch the external resource and report existence and drift
    ///
    /// On success, provider-sourced fields are written to `mg`'s status.
    fn observe(&self, ctx: &Context, mg: &mut M) -> Result<ExternalObservation>;

    /// Create the external resource
    fn create(&self, ctx: &Context, mg: &mut M) -> Result<()>;

    /// Push the desired mutable fields to the provider
    fn update(&self, ctx: &Context, mg: &M) -> Result<()>;

    /// Delete the external resource
    fn delete(&self, ctx: &Context, mg: &M) -> Result<()>;
}

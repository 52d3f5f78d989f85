//! Core types for managed resource reconciliation

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to the external resource when the managed object is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReclaimPolicy {
    /// Delete the external resource
    #[default]
    Delete,
    /// Leave the external resource in place
    Retain,
}

/// Identity of a managed object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name, unique within a manifest
    pub name: String,
    /// Provider-side identity; defaults to `name` on first reconcile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    /// Set when the object is marked for removal
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deletion_requested: bool,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The external name, or an empty string if none is set
    pub fn external_name(&self) -> &str {
        self.external_name.as_deref().unwrap_or_default()
    }
}

/// Kinds of status condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// Whether the last tick finished without error
    Synced,
    /// Whether the external resource is usable
    Ready,
}

/// Machine-readable reason for a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Available,
    Creating,
    Deleting,
    Unavailable,
    ReconcileSuccess,
    ReconcileError,
}

/// A single status condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub status: bool,
    pub reason: ConditionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(kind: ConditionType, status: bool, reason: ConditionReason) -> Self {
        Self {
            kind,
            status,
            reason,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    /// The external resource exists and matches the desired state
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, true, ConditionReason::Available)
    }

    /// The external resource was just created
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, false, ConditionReason::Creating)
    }

    /// The external resource is being deleted
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, false, ConditionReason::Deleting)
    }

    /// The external resource is not usable
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, false, ConditionReason::Unavailable)
    }

    /// The last tick completed
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, true, ConditionReason::ReconcileSuccess)
    }

    /// The last tick failed with `err`
    pub fn reconcile_error(err: &Error) -> Self {
        Self {
            message: Some(err.to_string()),
            ..Self::new(ConditionType::Synced, false, ConditionReason::ReconcileError)
        }
    }

    /// Compare everything except the transition time
    pub fn equal_ignoring_time(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Conditions attached to a managed object's status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionedStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionedStatus {
    /// Get the condition of the given kind
    pub fn get(&self, kind: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    /// Set conditions, replacing any existing condition of the same kind
    ///
    /// An existing condition that only differs in transition time is kept
    /// as is, so the time records the last real change.
    pub fn set(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for condition in conditions {
            match self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
                Some(existing) if existing.equal_ignoring_time(&condition) => {}
                Some(existing) => *existing = condition,
                None => self.conditions.push(condition),
            }
        }
    }

    /// Whether the condition of `kind` is present and true
    pub fn is_true(&self, kind: ConditionType) -> bool {
        self.get(kind).is_some_and(|c| c.status)
    }
}

/// Result of observing the external resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExternalObservation {
    /// The provider reports the resource exists
    pub resource_exists: bool,
    /// The resource matches the desired mutable fields
    pub resource_up_to_date: bool,
}

impl ExternalObservation {
    /// The provider has no such resource
    pub fn absent() -> Self {
        Self::default()
    }

    /// The provider has the resource
    pub fn present(up_to_date: bool) -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: up_to_date,
        }
    }
}

/// What a single reconciliation tick did
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The external resource was created
    Created,
    /// Drift was found and an update sent
    Updated,
    /// The external resource exists and matches
    UpToDate,
    /// The external resource was deleted (or was already absent)
    Deleted,
    /// Removal was requested but the reclaim policy retains the resource
    Released,
    /// The tick failed
    Failed { error: Error },
}

impl ReconcileOutcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the outcome represents a change on the provider
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }

    /// The error of a failed tick
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Whether the scheduler should try again on its next tick
    ///
    /// Created resources are requeued so the next Observe can confirm them.
    pub fn should_requeue(&self) -> bool {
        match self {
            Self::Created => true,
            Self::Failed { error } => error.is_retryable(),
            _ => false,
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::UpToDate => "up to date",
            Self::Deleted => "deleted",
            Self::Released => "released",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Summary of a tick over many resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub deleted: usize,
    pub released: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of provider-side changes
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Check if the tick was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.up_to_date + self.deleted + self.released + self.failed
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created => self.created += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::UpToDate => self.up_to_date += 1,
            ReconcileOutcome::Deleted => self.deleted += 1,
            ReconcileOutcome::Released => self.released += 1,
            ReconcileOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Options for a tick over many resources
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Number of resources reconciled in parallel
    pub jobs: usize,
    /// Upper bound on a single resource's reconciliation
    pub timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_condition_replaces_same_kind() {
        let mut status = ConditionedStatus::default();
        status.set([Condition::creating(), Condition::reconcile_success()]);
        status.set([Condition::available()]);

        assert_eq!(status.conditions.len(), 2);
        let ready = status.get(ConditionType::Ready).unwrap();
        assert_eq!(ready.reason, ConditionReason::Available);
        assert!(status.is_true(ConditionType::Ready));
        assert!(status.is_true(ConditionType::Synced));
    }

    #[test]
    fn test_set_condition_keeps_transition_time_when_unchanged() {
        let mut status = ConditionedStatus::default();
        let mut first = Condition::available();
        first.last_transition_time = DateTime::<Utc>::MIN_UTC;
        status.set([first]);

        status.set([Condition::available()]);

        let ready = status.get(ConditionType::Ready).unwrap();
        assert_eq!(ready.last_transition_time, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_reconcile_error_condition_carries_message() {
        let err = Error::configuration("cannot find reference", "missing");
        let condition = Condition::reconcile_error(&err);
        assert!(!condition.status);
        assert_eq!(condition.kind, ConditionType::Synced);
        assert_eq!(
            condition.message.as_deref(),
            Some("cannot find reference: missing")
        );
    }

    #[test]
    fn test_outcome_flags() {
        assert!(ReconcileOutcome::Created.is_change());
        assert!(ReconcileOutcome::Created.should_requeue());
        assert!(!ReconcileOutcome::UpToDate.is_change());
        assert!(!ReconcileOutcome::Released.is_change());

        let failed = ReconcileOutcome::Failed {
            error: Error::configuration("bad", "reference"),
        };
        assert!(!failed.is_success());
        assert!(!failed.should_requeue());
        assert!(failed.error().is_some());

        let transient = ReconcileOutcome::Failed {
            error: Error::provider_call("cannot get", "503"),
        };
        assert!(transient.should_requeue());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.add_outcome(&ReconcileOutcome::Created);
        summary.add_outcome(&ReconcileOutcome::Updated);
        summary.add_outcome(&ReconcileOutcome::UpToDate);
        summary.add_outcome(&ReconcileOutcome::Failed {
            error: Error::provider_call("cannot get", "503"),
        });

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.total_changes(), 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_object_meta_external_name() {
        let mut meta = ObjectMeta::new("svc-a");
        assert_eq!(meta.external_name(), "");
        meta.external_name = Some("svc-b".into());
        assert_eq!(meta.external_name(), "svc-b");
    }
}

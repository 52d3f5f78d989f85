//! The ServiceAccount managed object.
//!
//! `spec` is the caller-declared desired state; `status` is written only by
//! the reconciler and mirrors what the provider last reported.

use crate::store::ProviderReference;
use managed::{ConditionedStatus, Managed, ObjectMeta, ReclaimPolicy};
use serde::{Deserialize, Serialize};

/// Desired values of the mutable service account fields.
///
/// An unset field means "no opinion": it is neither compared nor cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAccountParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Desired state of a service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountSpec {
    /// Provider (project and credentials) to reconcile against.
    pub provider_ref: ProviderReference,
    /// What to do with the account when the object is removed.
    #[serde(default)]
    pub reclaim_policy: ReclaimPolicy,
    /// Mutable fields sent to the provider.
    #[serde(default)]
    pub for_provider: ServiceAccountParameters,
}

/// Provider-sourced fields, refreshed by every Observe and Create.
///
/// Advisory only: the provider is the source of truth. After an Update the
/// values are stale until the next Observe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAccountObservation {
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub oauth2_client_id: String,
    #[serde(default)]
    pub disabled: bool,
    /// Fully-qualified resource name.
    #[serde(default)]
    pub name: String,
}

/// Observed state and conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAccountStatus {
    #[serde(default)]
    pub at_provider: ServiceAccountObservation,
    #[serde(default)]
    pub conditioned: ConditionedStatus,
}

/// A GCP IAM service account managed by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub metadata: ObjectMeta,
    pub spec: ServiceAccountSpec,
    #[serde(default)]
    pub status: ServiceAccountStatus,
}

impl ServiceAccount {
    /// Kind discriminant used in manifests.
    pub const KIND: &'static str = "ServiceAccount";

    /// A service account named `name` reconciled through `provider`.
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            spec: ServiceAccountSpec {
                provider_ref: ProviderReference::new(provider),
                reclaim_policy: ReclaimPolicy::default(),
                for_provider: ServiceAccountParameters::default(),
            },
            status: ServiceAccountStatus::default(),
        }
    }

    /// The provider-side account id.
    pub fn external_name(&self) -> &str {
        self.metadata.external_name()
    }
}

impl Managed for ServiceAccount {
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn conditions(&self) -> &ConditionedStatus {
        &self.status.conditioned
    }

    fn conditions_mut(&mut self) -> &mut ConditionedStatus {
        &mut self.status.conditioned
    }

    fn reclaim_policy(&self) -> ReclaimPolicy {
        self.spec.reclaim_policy
    }
}

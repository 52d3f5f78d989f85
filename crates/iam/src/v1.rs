//! Wire types of the IAM Admin API, v1.
//!
//! Only the fields the reconciler reads or writes are modelled. JSON field
//! names follow the REST reference (camelCase).

use serde::{Deserialize, Serialize};

/// Update mask sent with every patch.
///
/// The mask is fixed: the patch endpoint is idempotent, so re-sending
/// unchanged values is harmless.
pub const UPDATE_MASK: &str = "description,displayName";

/// A service account as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceAccount {
    /// Fully-qualified resource name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Project the account belongs to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    /// Server-assigned numeric id.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    /// Account email address.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// OAuth2 client id of the account.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub oauth2_client_id: String,
    /// Whether the account is disabled.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Concurrency token.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub etag: String,
}

/// Body of `projects.serviceAccounts.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAccountRequest {
    /// Short id; becomes the local part of the account email.
    pub account_id: String,
    /// Initial mutable fields.
    pub service_account: ServiceAccount,
}

/// Body of `projects.serviceAccounts.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchServiceAccountRequest {
    /// Fields to write; only those named by `update_mask` are applied.
    pub service_account: ServiceAccount,
    /// Comma-separated field names.
    pub update_mask: String,
}

impl PatchServiceAccountRequest {
    /// A patch of the mutable fields with the fixed [`UPDATE_MASK`].
    pub fn new(service_account: ServiceAccount) -> Self {
        Self {
            service_account,
            update_mask: UPDATE_MASK.to_string(),
        }
    }
}

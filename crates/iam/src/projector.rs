//! Mapping between the managed object and IAM API shapes.

use crate::resource::{ServiceAccount, ServiceAccountObservation, ServiceAccountParameters};
use crate::v1;

/// Copy provider-sourced fields into the object's observed state.
pub fn populate_from_provider(sa: &mut ServiceAccount, from_provider: &v1::ServiceAccount) {
    sa.status.at_provider = ServiceAccountObservation {
        unique_id: from_provider.unique_id.clone(),
        email: from_provider.email.clone(),
        oauth2_client_id: from_provider.oauth2_client_id.clone(),
        disabled: from_provider.disabled,
        name: from_provider.name.clone(),
    };
}

/// The provider-shaped account for the desired parameters.
///
/// Unset optional fields become empty strings; the API has no way to omit
/// a field on create.
pub fn to_provider(params: &ServiceAccountParameters) -> v1::ServiceAccount {
    v1::ServiceAccount {
        display_name: params.display_name.clone().unwrap_or_default(),
        description: params.description.clone().unwrap_or_default(),
        ..v1::ServiceAccount::default()
    }
}

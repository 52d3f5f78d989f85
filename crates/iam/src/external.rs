//! The connected external client for service accounts.

use crate::backend::Backend;
use crate::drift::is_up_to_date;
use crate::error::ErrorContext;
use crate::namer::RelativeResourceNamer;
use crate::projector::{populate_from_provider, to_provider};
use crate::resource::ServiceAccount;
use crate::v1::{CreateServiceAccountRequest, PatchServiceAccountRequest};
use managed::{Context, ExternalClient, ExternalObservation, Managed};
use std::sync::Arc;

/// Lifecycle operations for service accounts in one project.
pub struct External {
    backend: Arc<dyn Backend>,
    namer: RelativeResourceNamer,
}

impl External {
    pub fn new(backend: Arc<dyn Backend>, namer: RelativeResourceNamer) -> Self {
        Self { backend, namer }
    }

    fn address(&self, sa: &ServiceAccount) -> String {
        self.namer.resource_address(sa.external_name())
    }
}

impl ExternalClient<ServiceAccount> for External {
    fn observe(&self, ctx: &Context, sa: &mut ServiceAccount) -> managed::Result<ExternalObservation> {
        let from_provider = match self.backend.get(ctx, &self.address(sa)) {
            Ok(account) => account,
            Err(e) if e.is_not_found() => return Ok(ExternalObservation::absent()),
            Err(e) => return Err(ErrorContext::Get.provider_call(e)),
        };

        populate_from_provider(sa, &from_provider);
        Ok(ExternalObservation::present(is_up_to_date(
            &sa.spec.for_provider,
            &from_provider,
        )))
    }

    fn create(&self, ctx: &Context, sa: &mut ServiceAccount) -> managed::Result<()> {
        let account_id = sa.external_name();
        if account_id.is_empty() {
            return Err(ErrorContext::EmptyExternalName
                .configuration(format!("object {:?} has no external name", sa.name())));
        }

        let request = CreateServiceAccountRequest {
            account_id: account_id.to_string(),
            service_account: to_provider(&sa.spec.for_provider),
        };
        let from_provider = self
            .backend
            .create(ctx, &self.namer.scope_address(), &request)
            .map_err(|e| ErrorContext::Create.provider_call(e))?;

        populate_from_provider(sa, &from_provider);
        Ok(())
    }

    fn update(&self, ctx: &Context, sa: &ServiceAccount) -> managed::Result<()> {
        let request = PatchServiceAccountRequest::new(to_provider(&sa.spec.for_provider));
        // Observed state is refreshed by the next observe, not from this response.
        self.backend
            .patch(ctx, &self.address(sa), &request)
            .map(|_| ())
            .map_err(|e| ErrorContext::Update.provider_call(e))
    }

    fn delete(&self, ctx: &Context, sa: &ServiceAccount) -> managed::Result<()> {
        match self.backend.delete(ctx, &self.address(sa)) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(ErrorContext::Delete.provider_call(e)),
        }
    }
}

//! Credential resolution: provider reference to IAM client.
//!
//! Resolution is strictly sequential and stops at the first failure:
//! provider configuration, then its secret reference, then the secret,
//! then client construction. No partially configured client is returned.

use crate::backend::Backend;
use crate::backend::http::HttpBackend;
use crate::error::{ErrorContext, Result as ApiResult};
use crate::external::External;
use crate::namer::RelativeResourceNamer;
use crate::resource::ServiceAccount;
use crate::store::{ProviderReference, ProviderStore, StoreError};
use managed::{Context, ExternalClient, ExternalConnecter};
use std::sync::Arc;

/// Builds an IAM backend from raw credential bytes.
pub type ClientFactory =
    Arc<dyn Fn(&Context, &[u8]) -> ApiResult<Arc<dyn Backend>> + Send + Sync>;

/// A client ready to address resources in one project.
#[derive(Clone)]
pub struct ResolvedClient {
    pub backend: Arc<dyn Backend>,
    pub namer: RelativeResourceNamer,
}

/// Resolves provider credentials into IAM clients.
///
/// Holds no per-resource state, so one connector serves every
/// reconciliation running in parallel.
#[derive(Clone)]
pub struct Connector {
    store: Arc<dyn ProviderStore>,
    new_client: ClientFactory,
}

impl Connector {
    /// A connector building [`HttpBackend`] clients.
    pub fn new(store: Arc<dyn ProviderStore>) -> Self {
        Self::with_client_factory(store, |_ctx: &Context, credentials: &[u8]| {
            let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_credentials(credentials)?);
            Ok(backend)
        })
    }

    /// A connector with a custom client factory (useful for testing).
    pub fn with_client_factory<F>(store: Arc<dyn ProviderStore>, new_client: F) -> Self
    where
        F: Fn(&Context, &[u8]) -> ApiResult<Arc<dyn Backend>> + Send + Sync + 'static,
    {
        Self {
            store,
            new_client: Arc::new(new_client),
        }
    }

    /// Resolve the client for the provider named by `reference`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the provider or the secret (or its key) is absent
    /// - `Configuration` if the provider has no credentials secret reference
    /// - `Connection` if the store is unavailable or the client cannot be built
    pub fn resolve_client(
        &self,
        ctx: &Context,
        reference: &ProviderReference,
    ) -> managed::Result<ResolvedClient> {
        let provider = self
            .store
            .get_provider(ctx, reference)
            .map_err(|e| store_error(ErrorContext::GetProvider, e))?;

        let Some(selector) = provider.credentials_secret_ref.as_ref() else {
            return Err(ErrorContext::ProviderSecretRef.configuration(format!(
                "provider {:?} has no credentials_secret_ref",
                provider.name
            )));
        };

        let secret = self
            .store
            .get_secret(ctx, &selector.namespace, &selector.name)
            .map_err(|e| store_error(ErrorContext::GetProviderSecret, e))?;

        let credentials = secret.get(&selector.key).ok_or_else(|| {
            ErrorContext::GetProviderSecret.not_found(format!(
                "secret {}/{} has no key {:?}",
                selector.namespace, selector.name, selector.key
            ))
        })?;

        let backend =
            (self.new_client)(ctx, credentials).map_err(|e| ErrorContext::NewClient.connection(e))?;

        Ok(ResolvedClient {
            backend,
            namer: RelativeResourceNamer::new(provider.project_id),
        })
    }
}

fn store_error(context: ErrorContext, err: StoreError) -> managed::Error {
    if err.is_not_found() {
        context.not_found(err)
    } else {
        context.connection(err)
    }
}

impl ExternalConnecter<ServiceAccount> for Connector {
    fn connect(
        &self,
        ctx: &Context,
        mg: &ServiceAccount,
    ) -> managed::Result<Box<dyn ExternalClient<ServiceAccount>>> {
        let resolved = self.resolve_client(ctx, &mg.spec.provider_ref)?;
        Ok(Box::new(External::new(resolved.backend, resolved.namer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::Error;
    use crate::store::{MemoryStore, ProviderConfig, SecretKeySelector};
    use managed::ErrorCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn selector() -> SecretKeySelector {
        SecretKeySelector {
            namespace: "system".into(),
            name: "gcp-creds".into(),
            key: "key.json".into(),
        }
    }

    fn store_with(credentials_secret_ref: Option<SecretKeySelector>) -> MemoryStore {
        let store = MemoryStore::new();
        store.add_provider(ProviderConfig {
            name: "gcp".into(),
            project_id: "proj-1".into(),
            credentials_secret_ref,
        });
        store
    }

    /// Connector whose factory counts constructions and returns a mock.
    fn counting_connector(store: MemoryStore, built: Arc<AtomicUsize>) -> Connector {
        Connector::with_client_factory(Arc::new(store), move |_ctx: &Context, creds: &[u8]| {
            built.fetch_add(1, Ordering::SeqCst);
            assert_eq!(creds, b"{\"type\":\"service_account\"}");
            let backend: Arc<dyn Backend> = Arc::new(MockBackend::new());
            Ok(backend)
        })
    }

    #[test]
    fn test_resolve_client() {
        let store = store_with(Some(selector()));
        store.add_secret_key("system", "gcp-creds", "key.json", "{\"type\":\"service_account\"}");
        let built = Arc::new(AtomicUsize::new(0));
        let connector = counting_connector(store, Arc::clone(&built));

        let resolved = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .unwrap();

        assert_eq!(resolved.namer.project(), "proj-1");
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_secret_ref_is_configuration_error() {
        let built = Arc::new(AtomicUsize::new(0));
        let connector = counting_connector(store_with(None), Arc::clone(&built));

        let err = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.context(), "cannot find Secret reference on Provider");
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_provider_is_not_found() {
        let connector = counting_connector(MemoryStore::new(), Arc::default());

        let err = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.context(), "cannot get Provider");
    }

    #[test]
    fn test_missing_secret_is_not_found() {
        let built = Arc::new(AtomicUsize::new(0));
        let connector = counting_connector(store_with(Some(selector())), Arc::clone(&built));

        let err = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.context(), "cannot get Provider Secret");
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_secret_key_is_not_found() {
        let store = store_with(Some(selector()));
        store.add_secret_key("system", "gcp-creds", "other.json", "{}");
        let connector = counting_connector(store, Arc::default());

        let err = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("key.json"));
    }

    #[test]
    fn test_client_construction_failure_is_connection_error() {
        let store = store_with(Some(selector()));
        store.add_secret_key("system", "gcp-creds", "key.json", "not a key");
        let connector = Connector::new(Arc::new(store));

        let err = connector
            .resolve_client(&Context::background(), &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::Connection);
        assert_eq!(err.context(), "cannot create new GCP IAM API client");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<Error>().is_some());
    }

    #[test]
    fn test_cancelled_context_is_connection_error() {
        let connector = counting_connector(store_with(Some(selector())), Arc::default());
        let ctx = Context::background();
        ctx.cancel();

        let err = connector
            .resolve_client(&ctx, &ProviderReference::new("gcp"))
            .err()
            .unwrap();

        assert_eq!(err.category(), ErrorCategory::Connection);
    }
}

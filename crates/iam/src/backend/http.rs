//! REST backend for the IAM Admin API.
//!
//! Requests are authorized with an access token obtained from the service
//! account key. The token is cached for the lifetime of the backend, which
//! the connecter builds fresh for every reconciliation tick.

use crate::backend::Backend;
use crate::credentials::{JWT_BEARER_GRANT, ServiceAccountKey, TokenResponse};
use crate::error::{Error, Result};
use crate::v1::{CreateServiceAccountRequest, PatchServiceAccountRequest, ServiceAccount};
use managed::Context;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// IAM Admin API base URL.
pub const DEFAULT_API_BASE: &str = "https://iam.googleapis.com/v1";

/// Tokens this close to expiry are refreshed before use.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// IAM backend over HTTPS.
///
/// # Example
///
/// ```no_run
/// use iam::backend::Backend;
/// use iam::backend::http::HttpBackend;
/// use managed::Context;
///
/// let credentials = std::fs::read("key.json").unwrap();
/// let backend = HttpBackend::from_credentials(&credentials).unwrap();
/// let account = backend
///     .get(
///         &Context::background(),
///         "projects/proj-1/serviceAccounts/svc-a@proj-1.iam.gserviceaccount.com",
///     )
///     .unwrap();
/// println!("{}", account.email);
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// IAM API base URL.
    api_base: String,
    /// Signing key for token requests.
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

impl HttpBackend {
    /// Create a backend for the public IAM endpoint.
    #[must_use]
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_api_base(key, DEFAULT_API_BASE)
    }

    /// Create a backend with a custom API base (for testing).
    #[must_use]
    pub fn with_api_base(key: ServiceAccountKey, api_base: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            key,
            token: Mutex::new(None),
        }
    }

    /// Build a backend from the raw bytes of a JSON service account key.
    pub fn from_credentials(credentials: &[u8]) -> Result<Self> {
        Ok(Self::new(ServiceAccountKey::from_json(credentials)?))
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// URL of a resource addressed by relative name.
    fn resource_url(&self, name: &str) -> String {
        format!("{}/{}", self.api_base, name)
    }

    /// URL of the service account collection of `parent`.
    fn collection_url(&self, parent: &str) -> String {
        format!("{}/{}/serviceAccounts", self.api_base, parent)
    }

    /// A bearer token, exchanging a fresh assertion when needed.
    fn access_token(&self, ctx: &Context) -> Result<String> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN
        {
            return Ok(token.value.clone());
        }

        let timeout = request_timeout(ctx)?;
        let assertion = self.key.assertion(chrono::Utc::now().timestamp())?;
        let response: TokenResponse = self
            .agent
            .post(self.key.token_uri())
            .config()
            .timeout_global(timeout)
            .build()
            .send_form([
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .map_err(token_error)?
            .body_mut()
            .read_json()
            .map_err(|e| Error::Auth(format!("unreadable token response: {e}")))?;

        let lifetime = response
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        *cached = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(response.access_token)
    }

    fn authorization(&self, ctx: &Context) -> Result<String> {
        Ok(format!("Bearer {}", self.access_token(ctx)?))
    }
}

/// Remaining time on the context, or an error if it is already done.
fn request_timeout(ctx: &Context) -> Result<Option<Duration>> {
    ctx.check()?;
    Ok(ctx.remaining())
}

fn token_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(code) => Error::Auth(format!("token endpoint returned HTTP {code}")),
        other => Error::from(other),
    }
}

impl Backend for HttpBackend {
    fn get(&self, ctx: &Context, name: &str) -> Result<ServiceAccount> {
        let authorization = self.authorization(ctx)?;
        let timeout = request_timeout(ctx)?;

        let account = self
            .agent
            .get(&self.resource_url(name))
            .config()
            .timeout_global(timeout)
            .build()
            .header("Authorization", &authorization)
            .header("Accept", "application/json")
            .call()?
            .body_mut()
            .read_json()?;

        Ok(account)
    }

    fn create(
        &self,
        ctx: &Context,
        parent: &str,
        request: &CreateServiceAccountRequest,
    ) -> Result<ServiceAccount> {
        let authorization = self.authorization(ctx)?;
        let timeout = request_timeout(ctx)?;

        let account = self
            .agent
            .post(&self.collection_url(parent))
            .config()
            .timeout_global(timeout)
            .build()
            .header("Authorization", &authorization)
            .send_json(request)?
            .body_mut()
            .read_json()?;

        Ok(account)
    }

    fn patch(
        &self,
        ctx: &Context,
        name: &str,
        request: &PatchServiceAccountRequest,
    ) -> Result<ServiceAccount> {
        let authorization = self.authorization(ctx)?;
        let timeout = request_timeout(ctx)?;

        let account = self
            .agent
            .patch(&self.resource_url(name))
            .config()
            .timeout_global(timeout)
            .build()
            .header("Authorization", &authorization)
            .send_json(request)?
            .body_mut()
            .read_json()?;

        Ok(account)
    }

    fn delete(&self, ctx: &Context, name: &str) -> Result<()> {
        let authorization = self.authorization(ctx)?;
        let timeout = request_timeout(ctx)?;

        self.agent
            .delete(&self.resource_url(name))
            .config()
            .timeout_global(timeout)
            .build()
            .header("Authorization", &authorization)
            .call()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use managed::ContextError;

    const KEY_FILE: &str = include_str!("../../testdata/service-account.json");
    const ADDRESS: &str = "projects/proj-1/serviceAccounts/svc-a@proj-1.iam.gserviceaccount.com";

    fn backend() -> HttpBackend {
        HttpBackend::from_credentials(KEY_FILE.as_bytes()).unwrap()
    }

    #[test]
    fn test_resource_url() {
        let url = backend().resource_url(ADDRESS);
        assert_eq!(
            url,
            "https://iam.googleapis.com/v1/projects/proj-1/serviceAccounts/svc-a@proj-1.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_collection_url() {
        let url = backend().collection_url("projects/proj-1");
        assert_eq!(
            url,
            "https://iam.googleapis.com/v1/projects/proj-1/serviceAccounts"
        );
    }

    #[test]
    fn test_custom_api_base_trims_slash() {
        let key = ServiceAccountKey::from_json(KEY_FILE.as_bytes()).unwrap();
        let backend = HttpBackend::with_api_base(key, "http://localhost:8080/v1/");
        assert_eq!(backend.api_base(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_from_invalid_credentials() {
        let err = HttpBackend::from_credentials(b"{}").err().unwrap();
        assert!(matches!(err, Error::InvalidCredentials(_)));
    }

    #[test]
    fn test_cancelled_context_skips_request() {
        let ctx = Context::background();
        ctx.cancel();

        let err = backend().get(&ctx, ADDRESS).unwrap_err();
        assert!(matches!(err, Error::Cancelled(ContextError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline_skips_request() {
        let ctx = Context::background().with_deadline(Instant::now());

        let err = backend().delete(&ctx, ADDRESS).unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled(ContextError::DeadlineExceeded)
        ));
    }

    #[test]
    fn test_request_timeout_follows_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(30));
        let timeout = request_timeout(&ctx).unwrap().unwrap();
        assert!(timeout <= Duration::from_secs(30));
        assert!(request_timeout(&Context::background()).unwrap().is_none());
    }
}

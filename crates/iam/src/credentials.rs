//! Service account key credentials.
//!
//! The credentials secret holds a JSON service account key as downloaded
//! from the Cloud console. The key signs a short-lived JWT assertion that
//! the token endpoint exchanges for an OAuth2 access token
//! (RFC 7523, JWT bearer grant).

use crate::error::{Error, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth2 scope requested for IAM Admin calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Grant type of the JWT bearer flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion (the token endpoint caps it at one hour).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Deserialize)]
struct KeyFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    private_key_id: Option<String>,
    private_key: String,
    client_email: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// A parsed service account key.
///
/// Only the signing key derived from the private key is kept; the raw
/// credential bytes are not. `Debug` output never includes key material.
#[derive(Clone)]
pub struct ServiceAccountKey {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    signing_key: EncodingKey,
}

impl ServiceAccountKey {
    /// Parse a JSON service account key.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCredentials` if the JSON is malformed, is not a
    /// `service_account` key, or carries an unusable private key.
    pub fn from_json(credentials: &[u8]) -> Result<Self> {
        let file: KeyFile = serde_json::from_slice(credentials)
            .map_err(|e| Error::InvalidCredentials(format!("malformed key file: {e}")))?;

        if file.kind != "service_account" {
            return Err(Error::InvalidCredentials(format!(
                "expected a service_account key, got {:?}",
                file.kind
            )));
        }
        if file.client_email.is_empty() {
            return Err(Error::InvalidCredentials(
                "key file has no client_email".to_string(),
            ));
        }

        let signing_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(|e| Error::InvalidCredentials(format!("unusable private key: {e}")))?;

        Ok(Self {
            client_email: file.client_email,
            private_key_id: file.private_key_id.filter(|id| !id.is_empty()),
            token_uri: file
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            signing_key,
        })
    }

    /// The account the key belongs to.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Where assertions are exchanged for access tokens.
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Sign an assertion issued at `now` (Unix seconds).
    pub fn assertion(&self, now: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.private_key_id);

        let claims = Claims {
            iss: self.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::Auth(format!("cannot sign assertion: {e}")))
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Successful response of the token endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

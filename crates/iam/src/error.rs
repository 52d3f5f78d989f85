//! Error types for IAM operations.
//!
//! [`Error`] is what the IAM API (and the token endpoint) returns.
//! [`ErrorContext`] labels each call site of the reconciler and turns
//! lower-level errors into [`managed::Error`] values with the right category.

use std::fmt;

/// Result type alias for IAM API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of IAM API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// The addressed resource does not exist.
    NotFound,
    /// Token exchange or authorization failed.
    Auth,
    /// The credential material is unusable.
    Credentials,
    /// Response could not be decoded.
    Format,
    /// The call was cancelled or ran out of time.
    Cancelled,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Cancelled)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Resource not found",
            Self::Auth => "Authorization failed",
            Self::Credentials => "Invalid credentials",
            Self::Format => "Invalid response format",
            Self::Cancelled => "Call cancelled",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::NotFound => "Verify the project and account id are correct",
            Self::Auth => "Check that the service account key is active and has IAM permissions",
            Self::Credentials => "Provide a JSON service account key in the credentials secret",
            Self::Format => "The API returned an unexpected body, try again",
            Self::Cancelled => "Increase the timeout and try again",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors returned by the IAM API client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Exchanging the key for an access token failed.
    #[error("token exchange failed: {0}")]
    Auth(String),

    /// The credential bytes are not a usable service account key.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The request did not finish in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The caller cancelled the context.
    #[error("request cancelled: {0}")]
    Cancelled(#[from] managed::ContextError),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::Http {
                status: Some(401 | 403),
                ..
            } => ErrorCategory::Auth,
            Error::Http { .. } => ErrorCategory::Network,
            Error::Auth(_) => ErrorCategory::Auth,
            Error::InvalidCredentials(_) => ErrorCategory::Credentials,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Timeout(_) | Error::Cancelled(_) => ErrorCategory::Cancelled,
        }
    }

    /// Whether the provider reported the resource as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(404) => Self::NotFound("HTTP 404".to_string()),
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            ureq::Error::Timeout(timeout) => Self::Timeout(timeout.to_string()),
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Call sites of the service account reconciler.
///
/// Each variant carries a fixed label used to wrap the underlying error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    /// Fetching the provider configuration (scope descriptor).
    GetProvider,
    /// The provider has no credentials secret reference.
    ProviderSecretRef,
    /// Fetching the credentials secret.
    GetProviderSecret,
    /// Building the IAM client from the credentials.
    NewClient,
    /// Creating without an external name.
    EmptyExternalName,
    /// Observing the service account.
    Get,
    /// Creating the service account.
    Create,
    /// Patching the service account.
    Update,
    /// Deleting the service account.
    Delete,
}

impl ErrorContext {
    /// The fixed label for this call site.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::GetProvider => "cannot get Provider",
            Self::ProviderSecretRef => "cannot find Secret reference on Provider",
            Self::GetProviderSecret => "cannot get Provider Secret",
            Self::NewClient => "cannot create new GCP IAM API client",
            Self::EmptyExternalName => "cannot create GCP ServiceAccount without an external name",
            Self::Get => "cannot get GCP ServiceAccount object via IAM API",
            Self::Create => "cannot create GCP ServiceAccount object via IAM API",
            Self::Update => "cannot update GCP ServiceAccount object via IAM API",
            Self::Delete => "cannot delete GCP ServiceAccount object via IAM API",
        }
    }

    /// A configuration error labelled with this call site.
    pub fn configuration(self, message: impl Into<String>) -> managed::Error {
        managed::Error::configuration(self.label(), message)
    }

    /// A not-found error labelled with this call site.
    pub fn not_found(self, source: impl Into<managed::BoxError>) -> managed::Error {
        managed::Error::not_found(self.label(), source)
    }

    /// A connection error labelled with this call site.
    pub fn connection(self, source: impl Into<managed::BoxError>) -> managed::Error {
        managed::Error::connection(self.label(), source)
    }

    /// Wrap an API error from a provider call.
    ///
    /// Cancellation keeps its own category so the scheduler can tell a
    /// timeout from a provider failure.
    pub fn provider_call(self, err: Error) -> managed::Error {
        match err {
            Error::Cancelled(cause) => managed::Error::cancelled(self.label(), cause),
            other => managed::Error::provider_call(self.label(), other),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

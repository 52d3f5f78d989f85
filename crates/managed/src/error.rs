//! Error types for managed resource reconciliation.
//!
//! Every error leaving a reconciliation step is wrapped with a static label
//! naming the operation that failed. Categories tell the scheduler whether a
//! later tick can be expected to succeed.

use crate::context::ContextError;
use std::fmt;

/// Boxed source error from a provider client or credential store.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A referenced object does not exist.
    NotFound,
    /// Structural misconfiguration (bad or missing reference).
    Configuration,
    /// Credential fetch or client construction failed.
    Connection,
    /// The provider rejected or failed a call.
    ProviderCall,
    /// The tick was cancelled or ran out of time.
    Cancelled,
}

impl ErrorCategory {
    /// Whether a later tick may succeed without anyone changing configuration.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection | Self::ProviderCall | Self::Cancelled)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Referenced object not found",
            Self::Configuration => "Configuration error",
            Self::Connection => "Cannot connect to provider",
            Self::ProviderCall => "Provider call failed",
            Self::Cancelled => "Reconciliation interrupted",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check that the referenced provider and secret exist",
            Self::Configuration => "Fix the resource or provider configuration",
            Self::Connection => "Check the credentials and network access to the provider",
            Self::ProviderCall => "The next reconciliation will retry the call",
            Self::Cancelled => "Increase the timeout or rerun the reconciliation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors surfaced by connecters, external clients and the reconciler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structural misconfiguration detected before any provider call.
    #[error("{context}: {message}")]
    Configuration {
        /// Operation label.
        context: &'static str,
        /// What is wrong.
        message: String,
    },

    /// A referenced object is absent.
    #[error("{context}: {source}")]
    NotFound {
        /// Operation label.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// Credential resolution or client construction failed.
    #[error("{context}: {source}")]
    Connection {
        /// Operation label.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// A non-not-found error from a provider call.
    #[error("{context}: {source}")]
    ProviderCall {
        /// Operation label.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// The context was cancelled or its deadline passed.
    #[error("{context}: {source}")]
    Cancelled {
        /// Operation label.
        context: &'static str,
        /// Cancellation cause.
        #[source]
        source: ContextError,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(context: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            context,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::NotFound {
            context,
            source: source.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            context,
            source: source.into(),
        }
    }

    /// Create a provider call error.
    pub fn provider_call(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::ProviderCall {
            context,
            source: source.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(context: &'static str, source: ContextError) -> Self {
        Self::Cancelled { context, source }
    }

    /// The static label naming the failed operation.
    #[must_use]
    pub fn context(&self) -> &'static str {
        match self {
            Self::Configuration { context, .. }
            | Self::NotFound { context, .. }
            | Self::Connection { context, .. }
            | Self::ProviderCall { context, .. }
            | Self::Cancelled { context, .. } => context,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::ProviderCall { .. } => ErrorCategory::ProviderCall,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }

    /// Whether a later tick may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

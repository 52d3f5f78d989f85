//! # iam
//!
//! GCP IAM service accounts as managed resources.
//!
//! This crate plugs service accounts into the [`managed`] reconciler:
//! - Deterministic resource addressing from project and account id
//! - Credential resolution from a provider configuration and its secret
//! - Drift detection over the mutable fields (display name, description)
//! - Projection of provider state into the object's status
//!
//! ## Example
//!
//! ```no_run
//! use iam::{Connector, MemoryStore, ServiceAccount};
//! use managed::{Context, Reconciler};
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let reconciler = Reconciler::new(Connector::new(Arc::new(store)));
//!
//! let mut sa = ServiceAccount::new("build-bot", "gcp");
//! sa.spec.for_provider.display_name = Some("Build bot".into());
//!
//! let outcome = reconciler.reconcile(&Context::background(), &mut sa);
//! println!("{}", outcome.label());
//! ```

pub mod backend;
pub mod connector;
pub mod credentials;
pub mod drift;
pub mod error;
pub mod external;
pub mod namer;
pub mod projector;
pub mod resource;
pub mod store;
pub mod v1;

pub use backend::Backend;
pub use backend::http::HttpBackend;
pub use connector::{ClientFactory, Connector, ResolvedClient};
pub use credentials::ServiceAccountKey;
pub use error::{Error, ErrorCategory, ErrorContext, Result};
pub use external::External;
pub use namer::RelativeResourceNamer;
pub use resource::{
    ServiceAccount, ServiceAccountObservation, ServiceAccountParameters, ServiceAccountSpec,
    ServiceAccountStatus,
};
pub use store::{
    MemoryStore, ProviderConfig, ProviderReference, ProviderStore, Secret, SecretKeySelector,
    StoreError,
};

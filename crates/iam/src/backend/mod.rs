//! Backend traits and implementations for the IAM service accounts API.
//!
//! This module provides the [`Backend`] trait and implementations for
//! talking to IAM. The primary implementation is [`http::HttpBackend`],
//! which calls the REST API directly.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use iam::backend::{Backend, MockBackend};
//! use iam::v1::{CreateServiceAccountRequest, ServiceAccount};
//! use managed::Context;
//!
//! let mock = MockBackend::new();
//! let ctx = Context::background();
//! let created = mock
//!     .create(&ctx, "projects/proj-1", &CreateServiceAccountRequest {
//!         account_id: "svc-a".to_string(),
//!         service_account: ServiceAccount::default(),
//!     })
//!     .unwrap();
//!
//! assert_eq!(created.email, "svc-a@proj-1.iam.gserviceaccount.com");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::namer::RelativeResourceNamer;
use crate::v1::{CreateServiceAccountRequest, PatchServiceAccountRequest, ServiceAccount};
use managed::Context;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The `projects.serviceAccounts` API surface used by the reconciler.
///
/// Every call takes a [`Context`]; implementations must stop before
/// issuing a request on a cancelled context and bound the request by the
/// context deadline.
pub trait Backend: Send + Sync {
    /// Fetch a service account by relative resource name.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the account does not exist.
    fn get(&self, ctx: &Context, name: &str) -> Result<ServiceAccount>;

    /// Create a service account under `parent` (`projects/{project}`).
    fn create(
        &self,
        ctx: &Context,
        parent: &str,
        request: &CreateServiceAccountRequest,
    ) -> Result<ServiceAccount>;

    /// Patch the fields named by the request's update mask.
    fn patch(
        &self,
        ctx: &Context,
        name: &str,
        request: &PatchServiceAccountRequest,
    ) -> Result<ServiceAccount>;

    /// Delete a service account.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the account does not exist.
    fn delete(&self, ctx: &Context, name: &str) -> Result<()>;
}

/// A call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Create {
        parent: String,
        request: CreateServiceAccountRequest,
    },
    Patch {
        name: String,
        request: PatchServiceAccountRequest,
    },
    Delete(String),
}

/// Which operation a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Patch,
    Delete,
}

/// Mock backend for testing without network access.
///
/// Accounts live in memory keyed by resource name. Every call is recorded,
/// and failures can be scripted per operation.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    accounts: Arc<Mutex<HashMap<String, ServiceAccount>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    failures: Arc<Mutex<HashMap<Operation, Error>>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an account as if it already existed.
    pub fn insert(&self, account: ServiceAccount) {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.insert(account.name.clone(), account);
    }

    /// Look up a stored account.
    pub fn account(&self, name: &str) -> Option<ServiceAccount> {
        self.accounts.lock().unwrap().get(name).cloned()
    }

    /// Fail every later call of `op` with `err`.
    pub fn fail(&self, op: Operation, err: Error) {
        self.failures.lock().unwrap().insert(op, err);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn begin(&self, ctx: &Context, op: Operation, call: Call) -> Result<()> {
        ctx.check()?;
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&op) {
            Some(err) => Err(replay(err)),
            None => Ok(()),
        }
    }
}

/// Rebuild a scripted error (API errors are not `Clone`).
fn replay(err: &Error) -> Error {
    match err {
        Error::NotFound(m) => Error::NotFound(m.clone()),
        Error::Http { message, status } => Error::http(message.clone(), *status),
        Error::Auth(m) => Error::Auth(m.clone()),
        Error::InvalidCredentials(m) => Error::InvalidCredentials(m.clone()),
        Error::InvalidResponse(m) => Error::InvalidResponse(m.clone()),
        Error::Timeout(m) => Error::Timeout(m.clone()),
        Error::Cancelled(cause) => Error::Cancelled(*cause),
    }
}

impl Backend for MockBackend {
    fn get(&self, ctx: &Context, name: &str) -> Result<ServiceAccount> {
        self.begin(ctx, Operation::Get, Call::Get(name.to_string()))?;
        self.account(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn create(
        &self,
        ctx: &Context,
        parent: &str,
        request: &CreateServiceAccountRequest,
    ) -> Result<ServiceAccount> {
        self.begin(
            ctx,
            Operation::Create,
            Call::Create {
                parent: parent.to_string(),
                request: request.clone(),
            },
        )?;

        let project = parent.strip_prefix("projects/").unwrap_or(parent);
        let namer = RelativeResourceNamer::new(project);
        let name = namer.resource_address(&request.account_id);

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&name) {
            return Err(Error::http("HTTP 409", Some(409)));
        }
        let unique_id = (100_000_000_000_000_000_000_u128 + accounts.len() as u128).to_string();
        let account = ServiceAccount {
            name: name.clone(),
            project_id: project.to_string(),
            email: format!("{}@{project}.iam.gserviceaccount.com", request.account_id),
            oauth2_client_id: unique_id.clone(),
            unique_id,
            display_name: request.service_account.display_name.clone(),
            description: request.service_account.description.clone(),
            ..ServiceAccount::default()
        };
        accounts.insert(name, account.clone());
        Ok(account)
    }

    fn patch(
        &self,
        ctx: &Context,
        name: &str,
        request: &PatchServiceAccountRequest,
    ) -> Result<ServiceAccount> {
        self.begin(
            ctx,
            Operation::Patch,
            Call::Patch {
                name: name.to_string(),
                request: request.clone(),
            },
        )?;

        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        for field in request.update_mask.split(',') {
            match field.trim() {
                "displayName" => {
                    account
                        .display_name
                        .clone_from(&request.service_account.display_name);
                }
                "description" => {
                    account
                        .description
                        .clone_from(&request.service_account.description);
                }
                _ => {}
            }
        }
        // The real endpoint only guarantees the patched fields.
        Ok(ServiceAccount {
            display_name: account.display_name.clone(),
            description: account.description.clone(),
            ..ServiceAccount::default()
        })
    }

    fn delete(&self, ctx: &Context, name: &str) -> Result<()> {
        self.begin(ctx, Operation::Delete, Call::Delete(name.to_string()))?;
        self.accounts
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }
}

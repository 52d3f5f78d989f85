//! Relative resource names for IAM service accounts.
//!
//! See <https://cloud.google.com/apis/design/resource_names#relative_resource_name>.
//! Service accounts are addressed as
//! `projects/{project}/serviceAccounts/{account}@{project}.iam.gserviceaccount.com`.

/// Email domain suffix of user-managed service accounts.
const DOMAIN_SUFFIX: &str = "iam.gserviceaccount.com";

/// Builds provider addresses for one project.
///
/// This is the only type that knows how IAM resource names are put
/// together. It is immutable and cheap to clone, so one namer can be
/// shared by every reconciliation in the same project.
///
/// No validation happens here: an empty account id yields a malformed
/// address, and callers check inputs before issuing calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeResourceNamer {
    project: String,
}

impl RelativeResourceNamer {
    /// Create a namer for `project`.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    /// The project this namer addresses.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Relative resource name of the project, e.g. `projects/proj-1`.
    pub fn scope_address(&self) -> String {
        format!("projects/{}", self.project)
    }

    /// Relative resource name of the service account `external_name`.
    pub fn resource_address(&self, external_name: &str) -> String {
        format!(
            "projects/{project}/serviceAccounts/{external_name}@{project}.{DOMAIN_SUFFIX}",
            project = self.project
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_address() {
        let namer = RelativeResourceNamer::new("proj-1");
        assert_eq!(namer.scope_address(), "projects/proj-1");
    }

    #[test]
    fn test_resource_address() {
        let namer = RelativeResourceNamer::new("proj-1");
        assert_eq!(
            namer.resource_address("svc-a"),
            "projects/proj-1/serviceAccounts/svc-a@proj-1.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_resource_address_is_deterministic() {
        let a = RelativeResourceNamer::new("proj-1");
        let b = RelativeResourceNamer::new("proj-1");
        assert_eq!(a.resource_address("svc-a"), b.resource_address("svc-a"));
        assert_eq!(a.resource_address("svc-a"), a.resource_address("svc-a"));
    }

    #[test]
    fn test_resource_address_depends_on_scope_and_name() {
        let namer = RelativeResourceNamer::new("proj-1");
        let other = RelativeResourceNamer::new("proj-2");
        assert_ne!(
            namer.resource_address("svc-a"),
            other.resource_address("svc-a")
        );
        assert_ne!(
            namer.resource_address("svc-a"),
            namer.resource_address("svc-b")
        );
    }

    #[test]
    fn test_scope_address_ignores_name() {
        let namer = RelativeResourceNamer::new("proj-1");
        let before = namer.scope_address();
        let _ = namer.resource_address("svc-a");
        assert_eq!(namer.scope_address(), before);
        assert!(!namer.scope_address().contains("svc-a"));
    }

    #[test]
    fn test_empty_name_does_not_panic() {
        let namer = RelativeResourceNamer::new("proj-1");
        assert_eq!(
            namer.resource_address(""),
            "projects/proj-1/serviceAccounts/@proj-1.iam.gserviceaccount.com"
        );
    }
}

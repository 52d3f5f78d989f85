//! Drift detection between desired parameters and the provider's account.

use crate::resource::ServiceAccountParameters;
use crate::v1;

/// Whether `observed` already matches `desired`.
///
/// Only fields that can be changed in place are considered. A field left
/// unset in `desired` is never compared: absence means "no opinion", not
/// "must be empty".
pub fn is_up_to_date(desired: &ServiceAccountParameters, observed: &v1::ServiceAccount) -> bool {
    matches_if_set(desired.display_name.as_deref(), &observed.display_name)
        && matches_if_set(desired.description.as_deref(), &observed.description)
}

fn matches_if_set(desired: Option<&str>, observed: &str) -> bool {
    desired.is_none_or(|want| want == observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(display_name: &str, description: &str) -> v1::ServiceAccount {
        v1::ServiceAccount {
            display_name: display_name.to_string(),
            description: description.to_string(),
            ..v1::ServiceAccount::default()
        }
    }

    fn desired(display_name: Option<&str>, description: Option<&str>) -> ServiceAccountParameters {
        ServiceAccountParameters {
            display_name: display_name.map(String::from),
            description: description.map(String::from),
        }
    }

    #[test]
    fn test_unset_fields_are_ignored() {
        let params = desired(None, None);
        assert!(is_up_to_date(&params, &observed("", "")));
        assert!(is_up_to_date(&params, &observed("anything", "at all")));
    }

    #[test]
    fn test_set_field_mismatch_is_drift() {
        let params = desired(Some("new"), None);
        assert!(!is_up_to_date(&params, &observed("old", "")));
        assert!(is_up_to_date(&params, &observed("new", "whatever")));
    }

    #[test]
    fn test_description_mismatch_is_drift() {
        let params = desired(None, Some("docs"));
        assert!(!is_up_to_date(&params, &observed("x", "other")));
        assert!(is_up_to_date(&params, &observed("x", "docs")));
    }

    #[test]
    fn test_explicit_empty_string_is_compared() {
        let params = desired(Some(""), None);
        assert!(!is_up_to_date(&params, &observed("set", "")));
        assert!(is_up_to_date(&params, &observed("", "")));
    }

    #[test]
    fn test_unset_field_never_flips_result() {
        let params = desired(Some("x"), None);
        for description in ["", "a", "b", "long description"] {
            assert!(is_up_to_date(&params, &observed("x", description)));
        }
    }

    #[test]
    fn test_comparison_is_byte_exact() {
        let params = desired(Some("Name"), None);
        assert!(!is_up_to_date(&params, &observed("name", "")));
        assert!(!is_up_to_date(&params, &observed("Name ", "")));
    }
}

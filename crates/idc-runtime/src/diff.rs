//! Diff computer.
//!
//! Walks a fixed, ordered list of attribute paths per resource kind and emits
//! a [`ChangeOperation`] for each path the caller expressed an opinion on. An
//! absent desired value is never turned into a "clear this field" operation.

use idc_core::convert::{self, Convention};
use idc_core::{ChangeOperation, DiffPolicy, Group, GroupSpec, PermissionSet, PermissionSetSpec, User, UserSpec};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Ordered change operations for one resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    pub operations: Vec<ChangeOperation>,
}

impl Diff {
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Attribute paths in emission order.
    pub fn paths(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.attribute_path.as_str()).collect()
    }

    pub fn touches(&self, path: &str) -> bool {
        self.operations.iter().any(|op| op.attribute_path == path)
    }
}

struct DiffBuilder {
    policy: DiffPolicy,
    operations: Vec<ChangeOperation>,
}

impl DiffBuilder {
    fn new(policy: DiffPolicy) -> Self {
        Self {
            policy,
            operations: Vec::new(),
        }
    }

    /// Scalar or nested value at `path`.
    fn field<T>(&mut self, path: &str, desired: Option<&T>, current: Option<&T>)
    where
        T: PartialEq + Serialize + ?Sized,
    {
        let Some(desired) = desired else {
            return;
        };
        if self.policy == DiffPolicy::ReassertAll || current != Some(desired) {
            self.push(path, desired);
        }
    }

    /// List replaced atomically; deep sequence equality decides no-op.
    fn list<T>(&mut self, path: &str, desired: Option<&Vec<T>>, current: &[T])
    where
        T: PartialEq + Serialize,
    {
        let Some(desired) = desired else {
            return;
        };
        if self.policy == DiffPolicy::ReassertAll || desired.as_slice() != current {
            self.push(path, desired);
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, path: &str, value: &T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.operations
            .push(ChangeOperation::new(path, convert::normalize(&value, Convention::Camel)));
    }

    fn finish(self) -> Diff {
        Diff {
            operations: self.operations,
        }
    }
}

/// Diff a located user against its desired state.
pub fn diff_user(current: &User, desired: &UserSpec, policy: DiffPolicy) -> Diff {
    let mut diff = DiffBuilder::new(policy);

    let want_name = desired.name.as_ref();
    let have_name = current.name.as_ref();
    let want_ent = desired.enterprise.as_ref();
    let have_ent = current.enterprise.as_ref();

    diff.field("userName", Some(desired.user_name.as_str()), current.user_name.as_deref());
    diff.field(
        "name.formatted",
        want_name.and_then(|n| n.formatted.as_deref()),
        have_name.and_then(|n| n.formatted.as_deref()),
    );
    diff.field(
        "name.familyName",
        want_name.and_then(|n| n.family_name.as_deref()),
        have_name.and_then(|n| n.family_name.as_deref()),
    );
    diff.field(
        "name.givenName",
        want_name.and_then(|n| n.given_name.as_deref()),
        have_name.and_then(|n| n.given_name.as_deref()),
    );
    diff.field(
        "name.middleName",
        want_name.and_then(|n| n.middle_name.as_deref()),
        have_name.and_then(|n| n.middle_name.as_deref()),
    );
    diff.field(
        "name.honorificPrefix",
        want_name.and_then(|n| n.honorific_prefix.as_deref()),
        have_name.and_then(|n| n.honorific_prefix.as_deref()),
    );
    diff.field(
        "name.honorificSuffix",
        want_name.and_then(|n| n.honorific_suffix.as_deref()),
        have_name.and_then(|n| n.honorific_suffix.as_deref()),
    );
    diff.list("emails", desired.emails.as_ref(), &current.emails);
    diff.field("displayName", desired.display_name.as_deref(), current.display_name.as_deref());
    diff.field("nickName", desired.nick_name.as_deref(), current.nick_name.as_deref());
    diff.field("profileUrl", desired.profile_url.as_deref(), current.profile_url.as_deref());
    diff.list("addresses", desired.addresses.as_ref(), &current.addresses);
    diff.list("phoneNumbers", desired.phone_numbers.as_ref(), &current.phone_numbers);
    diff.field("title", desired.title.as_deref(), current.title.as_deref());
    diff.field("locale", desired.locale.as_deref(), current.locale.as_deref());
    diff.field("timezone", desired.timezone.as_deref(), current.timezone.as_deref());
    diff.field(
        "preferredLanguage",
        desired.preferred_language.as_deref(),
        current.preferred_language.as_deref(),
    );
    diff.field("userType", desired.user_type.as_deref(), current.user_type.as_deref());
    diff.field(
        "enterprise.employeeNumber",
        want_ent.and_then(|e| e.employee_number.as_deref()),
        have_ent.and_then(|e| e.employee_number.as_deref()),
    );
    diff.field(
        "enterprise.costCenter",
        want_ent.and_then(|e| e.cost_center.as_deref()),
        have_ent.and_then(|e| e.cost_center.as_deref()),
    );
    diff.field(
        "enterprise.organization",
        want_ent.and_then(|e| e.organization.as_deref()),
        have_ent.and_then(|e| e.organization.as_deref()),
    );
    diff.field(
        "enterprise.division",
        want_ent.and_then(|e| e.division.as_deref()),
        have_ent.and_then(|e| e.division.as_deref()),
    );
    diff.field(
        "enterprise.department",
        want_ent.and_then(|e| e.department.as_deref()),
        have_ent.and_then(|e| e.department.as_deref()),
    );
    diff.field(
        "enterprise.manager",
        want_ent.and_then(|e| e.manager.as_deref()),
        have_ent.and_then(|e| e.manager.as_deref()),
    );

    diff.finish()
}

/// Diff a located group. The display name is the key, so only the
/// description can change.
pub fn diff_group(current: &Group, desired: &GroupSpec, policy: DiffPolicy) -> Diff {
    let mut diff = DiffBuilder::new(policy);
    diff.field("description", desired.description.as_deref(), current.description.as_deref());
    diff.finish()
}

/// Diff a located permission set, including its policy attachments.
///
/// Managed policies are an unordered set on the service side and compare as
/// one.
pub fn diff_permission_set(current: &PermissionSet, desired: &PermissionSetSpec, policy: DiffPolicy) -> Diff {
    let mut diff = DiffBuilder::new(policy);

    diff.field("description", desired.description.as_deref(), current.description.as_deref());
    diff.field(
        "sessionDuration",
        desired.session_duration.as_deref(),
        current.session_duration.as_deref(),
    );
    diff.field("relayState", desired.relay_state.as_deref(), current.relay_state.as_deref());

    if let Some(want) = &desired.managed_policies {
        let want: BTreeSet<&str> = want.iter().map(String::as_str).collect();
        let have: BTreeSet<&str> = current.managed_policies.iter().map(String::as_str).collect();
        if policy == DiffPolicy::ReassertAll || want != have {
            diff.push("managedPolicies", &want);
        }
    }

    // Policy documents are caller data; keys stay as written.
    if let Some(want) = &desired.inline_policy {
        if policy == DiffPolicy::ReassertAll || current.inline_policy.as_ref() != Some(want) {
            diff.operations.push(ChangeOperation::new("inlinePolicy", want.clone()));
        }
    }

    diff.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use idc_core::{Email, Enterprise, Name};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn current_user() -> User {
        User {
            user_id: "u-1".into(),
            identity_store_id: "d-1234567890".into(),
            user_name: Some("alice".into()),
            name: Some(Name {
                given_name: Some("Alice".into()),
                family_name: Some("Liddell".into()),
                ..Name::default()
            }),
            display_name: Some("Alice Liddell".into()),
            emails: vec![Email {
                value: Some("alice@example.com".into()),
                kind: Some("work".into()),
                primary: Some(true),
            }],
            ..User::default()
        }
    }

    fn matching_spec() -> UserSpec {
        UserSpec {
            user_name: "alice".into(),
            name: Some(Name {
                given_name: Some("Alice".into()),
                family_name: Some("Liddell".into()),
                ..Name::default()
            }),
            display_name: Some("Alice Liddell".into()),
            emails: Some(current_user().emails),
            ..UserSpec::default()
        }
    }

    #[test]
    fn test_equal_user_has_no_changes() {
        let diff = diff_user(&current_user(), &matching_spec(), DiffPolicy::OnlyChanged);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_reassert_all_emits_every_expressed_path() {
        let diff = diff_user(&current_user(), &matching_spec(), DiffPolicy::ReassertAll);
        assert_eq!(
            diff.paths(),
            vec!["userName", "name.familyName", "name.givenName", "emails", "displayName"]
        );
    }

    #[test]
    fn test_only_changed_fields_are_emitted() {
        let mut spec = matching_spec();
        spec.display_name = Some("Alice L.".into());
        spec.title = Some("Engineer".into());

        let diff = diff_user(&current_user(), &spec, DiffPolicy::OnlyChanged);
        assert_eq!(
            diff.operations,
            vec![
                ChangeOperation::new("displayName", json!("Alice L.")),
                ChangeOperation::new("title", json!("Engineer")),
            ]
        );
    }

    #[test]
    fn test_absent_fields_are_never_emitted() {
        let mut current = current_user();
        current.title = Some("Engineer".into());
        current.locale = Some("en-GB".into());

        let spec = UserSpec::new("alice");
        let diff = diff_user(&current, &spec, DiffPolicy::ReassertAll);
        assert_eq!(diff.paths(), vec!["userName"]);
    }

    #[test]
    fn test_list_values_are_camel_case_and_replaced_whole() {
        let mut spec = matching_spec();
        spec.emails = Some(vec![
            Email {
                value: Some("alice@example.com".into()),
                kind: Some("work".into()),
                primary: Some(true),
            },
            Email {
                value: Some("alice@home.example".into()),
                kind: Some("home".into()),
                primary: None,
            },
        ]);

        let diff = diff_user(&current_user(), &spec, DiffPolicy::OnlyChanged);
        assert_eq!(
            diff.operations,
            vec![ChangeOperation::new(
                "emails",
                json!([
                    { "value": "alice@example.com", "type": "work", "primary": true },
                    { "value": "alice@home.example", "type": "home" }
                ])
            )]
        );
    }

    #[test]
    fn test_diff_completeness_over_all_known_paths() {
        let spec = UserSpec {
            user_name: "alice".into(),
            name: Some(Name {
                formatted: Some("Dr Alice M Liddell Jr".into()),
                family_name: Some("Liddell".into()),
                given_name: Some("Alice".into()),
                middle_name: Some("M".into()),
                honorific_prefix: Some("Dr".into()),
                honorific_suffix: Some("Jr".into()),
            }),
            display_name: Some("Alice".into()),
            nick_name: Some("al".into()),
            profile_url: Some("https://example.com/al".into()),
            emails: Some(vec![]),
            addresses: Some(vec![]),
            phone_numbers: Some(vec![]),
            user_type: Some("Employee".into()),
            title: Some("Engineer".into()),
            preferred_language: Some("en".into()),
            locale: Some("en-GB".into()),
            timezone: Some("Europe/London".into()),
            enterprise: Some(Enterprise {
                employee_number: Some("1".into()),
                cost_center: Some("cc".into()),
                organization: Some("org".into()),
                division: Some("div".into()),
                department: Some("dep".into()),
                manager: Some("u-0".into()),
            }),
        };

        let diff = diff_user(&User::default(), &spec, DiffPolicy::ReassertAll);
        assert_eq!(diff.operations.len(), 24);

        // Dropping one expressed path drops exactly that operation.
        let mut partial = spec.clone();
        partial.enterprise.as_mut().unwrap().division = None;
        partial.timezone = None;
        let diff = diff_user(&User::default(), &partial, DiffPolicy::ReassertAll);
        assert_eq!(diff.operations.len(), 22);
        assert!(!diff.touches("timezone"));
        assert!(!diff.touches("enterprise.division"));
    }

    #[test]
    fn test_group_description_diff() {
        let current = Group {
            group_id: "g-1".into(),
            identity_store_id: "d-1234567890".into(),
            display_name: Some("admins".into()),
            description: Some("old".into()),
        };
        let spec = GroupSpec {
            display_name: "admins".into(),
            description: Some("new".into()),
        };
        assert_eq!(diff_group(&current, &spec, DiffPolicy::OnlyChanged).paths(), vec!["description"]);

        let spec = GroupSpec {
            display_name: "admins".into(),
            description: None,
        };
        assert!(!diff_group(&current, &spec, DiffPolicy::ReassertAll).has_changes());
    }

    #[test]
    fn test_permission_set_policies_compare_as_sets() {
        let current = PermissionSet {
            permission_set_arn: "arn".into(),
            name: "PowerUser".into(),
            session_duration: Some("PT1H".into()),
            managed_policies: vec!["b".into(), "a".into()],
            inline_policy: Some(json!({ "Version": "2012-10-17" })),
            ..PermissionSet::default()
        };
        let spec = PermissionSetSpec {
            name: "PowerUser".into(),
            session_duration: Some("PT1H".into()),
            managed_policies: Some(vec!["a".into(), "b".into()]),
            inline_policy: Some(json!({ "Version": "2012-10-17" })),
            ..PermissionSetSpec::default()
        };
        assert!(!diff_permission_set(&current, &spec, DiffPolicy::OnlyChanged).has_changes());

        let mut spec = spec;
        spec.session_duration = Some("PT8H".into());
        spec.managed_policies = Some(vec!["a".into()]);
        spec.inline_policy = Some(json!({ "Version": "2012-10-17", "Statement": [] }));
        let diff = diff_permission_set(&current, &spec, DiffPolicy::OnlyChanged);
        assert_eq!(diff.paths(), vec!["sessionDuration", "managedPolicies", "inlinePolicy"]);
        assert_eq!(
            diff.operations[2].value,
            json!({ "Version": "2012-10-17", "Statement": [] })
        );
    }
}

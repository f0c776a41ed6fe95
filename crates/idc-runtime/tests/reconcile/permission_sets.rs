use crate::common::{directory, instance_ctx, INSTANCE, PS_ARN};
use idc_core::{ClientError, PermissionSet, PermissionSetSpec, ReconcileError, State};
use idc_runtime::{InMemoryDirectory, PermissionSetKind, Reconciler};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const READ_ONLY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";
const BILLING: &str = "arn:aws:iam::aws:policy/job-function/Billing";
const SUPPORT: &str = "arn:aws:iam::aws:policy/AWSSupportAccess";

fn policy_document() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{ "Effect": "Allow", "Action": "s3:GetObject", "Resource": "*" }]
    })
}

fn power_user() -> PermissionSetSpec {
    PermissionSetSpec {
        name: "PowerUser".to_string(),
        description: Some("Power users".to_string()),
        session_duration: Some("PT1H".to_string()),
        managed_policies: Some(vec![READ_ONLY.to_string(), BILLING.to_string()]),
        inline_policy: Some(policy_document()),
        ..PermissionSetSpec::default()
    }
}

fn seeded(directory: &InMemoryDirectory) {
    directory.seed_permission_set(
        INSTANCE,
        PermissionSet {
            permission_set_arn: PS_ARN.to_string(),
            name: "PowerUser".to_string(),
            description: Some("Power users".to_string()),
            session_duration: Some("PT1H".to_string()),
            managed_policies: vec![BILLING.to_string(), READ_ONLY.to_string()],
            inline_policy: Some(policy_document()),
            ..PermissionSet::default()
        },
    );
}

#[tokio::test]
async fn test_create_attaches_policies() {
    let directory = directory();
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &power_user(), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.message, "Permission set PowerUser created successfully");
    assert!(result.resource_id.starts_with("arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/ps-"));
    assert_eq!(directory.call_count("attach_managed_policy"), 2);
    assert_eq!(directory.call_count("put_inline_policy"), 1);

    let resource = result.resource.unwrap();
    assert_eq!(resource["permission_set_arn"], json!(result.resource_id));
    assert_eq!(resource["session_duration"], json!("PT1H"));
    assert_eq!(resource["managed_policies"], json!([READ_ONLY, BILLING]));
    // Policy documents keep their own key casing.
    assert_eq!(resource["inline_policy"], policy_document());
    assert!(resource["created_date"].is_string());
}

#[tokio::test]
async fn test_policy_order_does_not_cause_updates() {
    let directory = directory();
    seeded(&directory);
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &power_user(), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.resource_id, PS_ARN);
    assert_eq!(directory.mutation_count(), 0);
}

#[tokio::test]
async fn test_update_converges_policies_and_attributes() {
    let directory = directory();
    seeded(&directory);
    let ctx = instance_ctx();

    let mut desired = power_user();
    desired.session_duration = Some("PT8H".to_string());
    desired.managed_policies = Some(vec![READ_ONLY.to_string(), SUPPORT.to_string()]);

    let result = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &desired, State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.message, "Permission set PowerUser updated successfully");
    assert_eq!(directory.call_count("update_permission_set"), 1);
    assert_eq!(directory.call_count("attach_managed_policy"), 1);
    assert_eq!(directory.call_count("detach_managed_policy"), 1);
    assert_eq!(directory.call_count("put_inline_policy"), 0);

    let stored = directory.permission_set("PowerUser").unwrap();
    assert_eq!(stored.session_duration.as_deref(), Some("PT8H"));
    assert_eq!(stored.description.as_deref(), Some("Power users"));
    let mut policies = stored.managed_policies.clone();
    policies.sort();
    assert_eq!(policies, vec![SUPPORT.to_string(), READ_ONLY.to_string()]);
}

#[tokio::test]
async fn test_inline_policy_change_is_put() {
    let directory = directory();
    seeded(&directory);
    let ctx = instance_ctx();

    let mut desired = PermissionSetSpec::new("PowerUser");
    desired.inline_policy = Some(json!({ "Version": "2012-10-17", "Statement": [] }));

    let result = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &desired, State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(directory.mutation_count(), 1);
    assert_eq!(
        directory.permission_set("PowerUser").unwrap().inline_policy,
        Some(json!(r#"{"Statement":[],"Version":"2012-10-17"}"#))
    );
}

#[tokio::test]
async fn test_name_lookup_pages_through_describes() {
    let directory = directory().with_page_size(1);
    for (index, name) in ["Billing", "ReadOnly"].iter().enumerate() {
        directory.seed_permission_set(
            INSTANCE,
            PermissionSet {
                permission_set_arn: format!("arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/ps-{index:016}"),
                name: name.to_string(),
                ..PermissionSet::default()
            },
        );
    }
    seeded(&directory);
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &power_user(), State::Absent)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.resource_id, PS_ARN);
    assert_eq!(directory.call_count("list_permission_sets"), 3);
    assert_eq!(directory.call_count("describe_permission_set"), 3);
    assert!(directory.permission_set("PowerUser").is_none());
}

#[tokio::test]
async fn test_missing_inline_policy_is_not_an_error() {
    let directory = directory();
    directory.seed_permission_set(
        INSTANCE,
        PermissionSet {
            permission_set_arn: PS_ARN.to_string(),
            name: "ReadOnly".to_string(),
            ..PermissionSet::default()
        },
    );
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(
            &PermissionSetKind::new(&directory),
            &PermissionSetSpec::new("ReadOnly"),
            State::Present,
        )
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(directory.call_count("get_inline_policy"), 1);
}

#[tokio::test]
async fn test_failed_policy_attach_fails_the_create() {
    let directory = directory();
    directory.fail_on("attach_managed_policy", ClientError::Api("LimitExceeded".to_string()));
    let ctx = instance_ctx();

    let err = Reconciler::new(&ctx)
        .reconcile(&PermissionSetKind::new(&directory), &power_user(), State::Present)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Create { kind: "Permission set", .. }));
}

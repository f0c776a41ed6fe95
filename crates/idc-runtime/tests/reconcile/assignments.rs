use crate::common::{directory, instance_ctx, ACCOUNT, INSTANCE, PS_ARN};
use idc_core::{AccountAssignment, AssignmentSpec, PrincipalType, State, TargetType};
use idc_runtime::{AssignmentKind, Reconciler};
use pretty_assertions::assert_eq;

fn assignment(principal_id: &str) -> AssignmentSpec {
    AssignmentSpec {
        target_id: ACCOUNT.to_string(),
        target_type: TargetType::AwsAccount,
        permission_set_arn: PS_ARN.to_string(),
        principal_type: PrincipalType::Group,
        principal_id: principal_id.to_string(),
    }
}

#[tokio::test]
async fn test_create_reports_request_status() {
    let directory = directory();
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&AssignmentKind::new(&directory), &assignment("g-1"), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.resource_id, "");
    assert_eq!(
        result.message,
        format!("Assignment GROUP:g-1 -> {ACCOUNT} ({PS_ARN}) created successfully")
    );
    assert_eq!(result.request_status.as_deref(), Some("IN_PROGRESS"));
    assert_eq!(
        result.resource.unwrap()["principal_type"],
        serde_json::json!("GROUP")
    );
    assert_eq!(directory.assignments(), vec![AccountAssignment::from(&assignment("g-1"))]);
}

#[tokio::test]
async fn test_existing_assignment_is_a_no_op() {
    let directory = directory();
    directory.seed_assignment(INSTANCE, AccountAssignment::from(&assignment("g-1")));
    let ctx = instance_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&AssignmentKind::new(&directory), &assignment("g-1"), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert!(result.message.ends_with("already exists"));
    assert!(result.request_status.is_none());
    assert_eq!(directory.mutation_count(), 0);
}

#[tokio::test]
async fn test_only_the_exact_tuple_matches() {
    let directory = directory();
    directory.seed_assignment(INSTANCE, AccountAssignment::from(&assignment("g-1")));
    let ctx = instance_ctx();
    let reconciler = Reconciler::new(&ctx);
    let kind = AssignmentKind::new(&directory);

    let mut as_user = assignment("g-1");
    as_user.principal_type = PrincipalType::User;
    let result = reconciler.reconcile(&kind, &as_user, State::Absent).await.unwrap();
    assert!(!result.changed);

    let result = reconciler.reconcile(&kind, &assignment("g-2"), State::Absent).await.unwrap();
    assert!(!result.changed);

    let result = reconciler.reconcile(&kind, &assignment("g-1"), State::Absent).await.unwrap();
    assert!(result.changed);
    assert_eq!(result.request_status.as_deref(), Some("IN_PROGRESS"));
    assert!(directory.assignments().is_empty());
}

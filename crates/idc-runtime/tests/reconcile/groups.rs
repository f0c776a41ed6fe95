use crate::common::{directory, store_ctx, STORE};
use idc_core::{Group, GroupSpec, State};
use idc_runtime::{GroupKind, Reconciler};
use pretty_assertions::assert_eq;
use serde_json::json;

fn admins(description: Option<&str>) -> GroupSpec {
    GroupSpec {
        display_name: "admins".to_string(),
        description: description.map(str::to_string),
    }
}

#[tokio::test]
async fn test_group_lifecycle() {
    let directory = directory();
    let ctx = store_ctx();
    let reconciler = Reconciler::new(&ctx);
    let kind = GroupKind::new(&directory);

    let created = reconciler
        .reconcile(&kind, &admins(Some("Administrators")), State::Present)
        .await
        .unwrap();
    assert!(created.changed);
    assert_eq!(created.message, "Group admins created successfully");
    assert_eq!(
        created.resource.unwrap(),
        json!({
            "group_id": created.resource_id,
            "identity_store_id": STORE,
            "display_name": "admins",
            "description": "Administrators"
        })
    );

    let unchanged = reconciler
        .reconcile(&kind, &admins(Some("Administrators")), State::Present)
        .await
        .unwrap();
    assert!(!unchanged.changed);
    assert_eq!(unchanged.message, "Group admins already exists");

    let updated = reconciler
        .reconcile(&kind, &admins(Some("Account administrators")), State::Present)
        .await
        .unwrap();
    assert!(updated.changed);
    assert_eq!(updated.message, "Group admins updated successfully");
    assert_eq!(
        directory.group("admins").unwrap().description.as_deref(),
        Some("Account administrators")
    );

    let deleted = reconciler.reconcile(&kind, &admins(None), State::Absent).await.unwrap();
    assert!(deleted.changed);
    assert_eq!(deleted.message, "Group admins deleted successfully");
    assert!(directory.group("admins").is_none());
    assert_eq!(directory.mutation_count(), 3);
}

#[tokio::test]
async fn test_omitted_description_is_not_cleared() {
    let directory = directory();
    directory.seed_group(Group {
        group_id: "g-1".to_string(),
        identity_store_id: STORE.to_string(),
        display_name: Some("admins".to_string()),
        description: Some("Administrators".to_string()),
    });
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&GroupKind::new(&directory), &admins(None), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.resource_id, "g-1");
    assert_eq!(directory.mutation_count(), 0);
}

#[tokio::test]
async fn test_groups_in_other_stores_are_invisible() {
    let directory = directory();
    directory.seed_group(Group {
        group_id: "g-other".to_string(),
        identity_store_id: "d-0000000000".to_string(),
        display_name: Some("admins".to_string()),
        description: None,
    });
    let ctx = store_ctx().with_check_mode(true);

    let result = Reconciler::new(&ctx)
        .reconcile(&GroupKind::new(&directory), &admins(None), State::Present)
        .await
        .unwrap();

    assert_eq!(result.message, "Group admins would be created (check mode)");
}

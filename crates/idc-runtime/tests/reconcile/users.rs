use crate::common::{alice, alice_spec, directory, store_ctx, work_email, STORE};
use idc_core::params;
use idc_core::{ClientError, DiffPolicy, Email, ReconcileError, State, User, UserSpec};
use idc_runtime::{InMemoryDirectory, Reconciler, UserKind};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_create_when_absent() {
    let directory = directory();
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    let stored = directory.user("alice").unwrap();
    assert!(result.changed);
    assert_eq!(result.resource_id, stored.user_id);
    assert_eq!(result.message, "User alice created successfully");
    assert_eq!(directory.call_count("create_user"), 1);
    assert_eq!(directory.mutation_count(), 1);

    let resource = result.resource.unwrap();
    assert_eq!(resource["user_id"], json!(stored.user_id));
    assert_eq!(resource["user_name"], json!("alice"));
    assert_eq!(resource["name"], json!({ "family_name": "Liddell", "given_name": "Alice" }));
    assert_eq!(
        resource["emails"],
        json!([{ "value": "alice@example.com", "type": "work", "primary": true }])
    );
}

#[tokio::test]
async fn test_existing_user_without_diff_is_untouched() {
    let directory = directory();
    directory.seed_user(alice());
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.resource_id, "u-alice");
    assert_eq!(result.message, "User alice already exists");
    assert!(result.resource.is_none());
    assert_eq!(directory.calls(), vec!["list_users".to_string()]);
}

#[tokio::test]
async fn test_delete_when_present() {
    let directory = directory();
    directory.seed_user(alice());
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &UserSpec::new("alice"), State::Absent)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.message, "User alice deleted successfully");
    assert_eq!(directory.call_count("delete_user"), 1);
    assert!(directory.user("alice").is_none());
}

#[tokio::test]
async fn test_absent_user_stays_absent() {
    let directory = directory();
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &UserSpec::new("alice"), State::Absent)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.resource_id, "");
    assert_eq!(result.message, "User alice does not exist");
    assert_eq!(directory.mutation_count(), 0);
}

#[tokio::test]
async fn test_check_mode_create_makes_no_calls() {
    let directory = directory();
    let ctx = store_ctx().with_check_mode(true);

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.resource_id, "");
    assert!(result.resource.is_none());
    assert_eq!(result.message, "User alice would be created (check mode)");
    assert_eq!(directory.mutation_count(), 0);
    assert!(directory.user("alice").is_none());
}

#[tokio::test]
async fn test_check_mode_update_and_delete_make_no_calls() {
    let directory = directory();
    directory.seed_user(alice());
    let ctx = store_ctx().with_check_mode(true);
    let reconciler = Reconciler::new(&ctx);
    let kind = UserKind::new(&directory);

    let mut desired = alice_spec();
    desired.title = Some("Engineer".to_string());
    let result = reconciler.reconcile(&kind, &desired, State::Present).await.unwrap();
    assert!(result.changed);
    assert_eq!(result.resource_id, "u-alice");
    assert_eq!(result.message, "User alice would be updated (check mode)");

    let result = reconciler.reconcile(&kind, &desired, State::Absent).await.unwrap();
    assert!(result.changed);
    assert_eq!(result.message, "User alice would be deleted (check mode)");

    assert_eq!(directory.mutation_count(), 0);
    assert_eq!(directory.user("alice"), Some(alice()));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let directory = directory();
    let ctx = store_ctx();
    let reconciler = Reconciler::new(&ctx);
    let kind = UserKind::new(&directory);

    let first = reconciler.reconcile(&kind, &alice_spec(), State::Present).await.unwrap();
    let second = reconciler.reconcile(&kind, &alice_spec(), State::Present).await.unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(second.resource_id, first.resource_id);
    assert_eq!(directory.mutation_count(), 1);

    let gone = reconciler.reconcile(&kind, &alice_spec(), State::Absent).await.unwrap();
    let still_gone = reconciler.reconcile(&kind, &alice_spec(), State::Absent).await.unwrap();
    assert!(gone.changed);
    assert!(!still_gone.changed);
    assert_eq!(directory.mutation_count(), 2);
}

fn alice_with_home_email() -> UserSpec {
    params::parse_user(&json!({
        "identity_store_id": STORE,
        "user_name": "alice",
        "emails": [
            { "value": "alice@example.com", "type": "work", "primary": true },
            { "value": "alice@home.example", "type": "home", "primary": false }
        ]
    }))
    .unwrap()
    .desired
}

#[tokio::test]
async fn test_explicit_non_primary_flag_is_idempotent() {
    let directory = directory();
    let ctx = store_ctx();
    let reconciler = Reconciler::new(&ctx);
    let kind = UserKind::new(&directory);

    let first = reconciler.reconcile(&kind, &alice_with_home_email(), State::Present).await.unwrap();
    let second = reconciler.reconcile(&kind, &alice_with_home_email(), State::Present).await.unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(directory.mutation_count(), 1);
}

#[tokio::test]
async fn test_unset_remote_flag_matches_explicit_false() {
    let directory = directory();
    // Shaped the way the directory reports it: no flag on the secondary email.
    directory.seed_user(User {
        user_id: "u-alice".to_string(),
        identity_store_id: STORE.to_string(),
        user_name: Some("alice".to_string()),
        emails: vec![
            work_email("alice@example.com"),
            Email {
                value: Some("alice@home.example".to_string()),
                kind: Some("home".to_string()),
                primary: None,
            },
        ],
        ..User::default()
    });
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_with_home_email(), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.message, "User alice already exists");
    assert_eq!(directory.mutation_count(), 0);
}

#[tokio::test]
async fn test_update_sends_only_changed_attributes() {
    let directory = directory();
    directory.seed_user(alice());
    let ctx = store_ctx();

    let mut desired = alice_spec();
    desired.display_name = Some("Alice L.".to_string());
    desired.locale = Some("en-GB".to_string());

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &desired, State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.resource_id, "u-alice");
    assert_eq!(result.message, "User alice updated successfully");
    assert_eq!(directory.call_count("update_user"), 1);

    let stored = directory.user("alice").unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Alice L."));
    assert_eq!(stored.locale.as_deref(), Some("en-GB"));
    assert_eq!(stored.emails, alice().emails);

    let resource = result.resource.unwrap();
    assert_eq!(resource["display_name"], json!("Alice L."));
}

#[tokio::test]
async fn test_unexpressed_attributes_are_left_alone() {
    let directory = directory();
    let mut stored = alice();
    stored.title = Some("Engineer".to_string());
    directory.seed_user(stored.clone());
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &UserSpec::new("alice"), State::Present)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(directory.user("alice"), Some(stored));
}

#[tokio::test]
async fn test_reassert_all_updates_equal_values() {
    let directory = directory();
    directory.seed_user(alice());
    let ctx = store_ctx().with_diff_policy(DiffPolicy::ReassertAll);

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.message, "User alice updated successfully");
    assert_eq!(directory.call_count("update_user"), 1);
    assert_eq!(directory.user("alice"), Some(alice()));
}

#[tokio::test]
async fn test_locate_relies_on_server_filter() {
    let directory = InMemoryDirectory::new().with_page_size(1);
    for name in ["bob", "carol", "dave"] {
        directory.seed_user(User::from_spec(format!("u-{name}"), STORE, &UserSpec::new(name)));
    }
    directory.seed_user(alice());
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    // The filter narrows the listing to one user, so one page is enough.
    assert!(!result.changed);
    assert_eq!(directory.call_count("list_users"), 1);
}

#[tokio::test]
async fn test_user_name_match_is_exact() {
    let directory = directory();
    directory.seed_user(User::from_spec("u-upper", STORE, &UserSpec::new("Alice")));
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &UserSpec::new("alice"), State::Absent)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.message, "User alice does not exist");
}

#[tokio::test]
async fn test_concurrent_delete_is_absorbed() {
    let directory = directory();
    directory.seed_user(alice());
    directory.fail_on("delete_user", ClientError::NotFound("user u-alice".to_string()));
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &UserSpec::new("alice"), State::Absent)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.message, "User alice does not exist");
}

#[tokio::test]
async fn test_failures_are_wrapped_with_kind_and_key() {
    let directory = directory();
    let ctx = store_ctx();
    let reconciler = Reconciler::new(&ctx);
    let kind = UserKind::new(&directory);

    directory.fail_on("create_user", ClientError::Api("AccessDeniedException".to_string()));
    let err = reconciler.reconcile(&kind, &alice_spec(), State::Present).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Create { kind: "User", .. }));
    assert_eq!(err.to_string(), "failed to create User alice: AccessDeniedException");
    assert!(err.is_remote());

    directory.clear_failures();
    directory.seed_user(alice());
    directory.fail_on("delete_user", ClientError::Api("ThrottlingException".to_string()));
    let err = reconciler.reconcile(&kind, &alice_spec(), State::Absent).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Delete { .. }));

    directory.fail_on("update_user", ClientError::Api("ValidationException".to_string()));
    let mut desired = alice_spec();
    desired.title = Some("Engineer".to_string());
    let err = reconciler.reconcile(&kind, &desired, State::Present).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Update { .. }));
    assert_eq!(directory.call_count("update_user"), 1);
}

#[tokio::test]
async fn test_lookup_failure_stops_before_any_mutation() {
    let directory = directory();
    directory.fail_on("list_users", ClientError::Api("ExpiredToken".to_string()));
    let ctx = store_ctx();

    let err = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Fetch { .. }));
    assert_eq!(err.to_string(), "failed to look up User alice: ExpiredToken");
    assert_eq!(directory.mutation_count(), 0);
}

use crate::common::{alice_spec, directory, store_ctx};
use idc_core::{ReconcileError, State, WaitPolicy};
use idc_runtime::{Reconciler, UserKind};
use std::time::Duration;
use tokio::time::Instant;

fn wait(timeout: u64, delay: u64) -> Option<WaitPolicy> {
    Some(WaitPolicy::new(Duration::from_secs(timeout), Duration::from_secs(delay)).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_snapshot_once_visible() {
    let directory = directory().with_visibility_lag(2);
    let ctx = store_ctx().with_wait(wait(30, 5));
    let started = Instant::now();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.resource.unwrap()["user_name"], "alice");
    // initial locate + two hidden probes + the one that finds it
    assert_eq!(directory.call_count("list_users"), 4);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_distinctly_from_create_failure() {
    let directory = directory().with_visibility_lag(10);
    let ctx = store_ctx().with_wait(wait(12, 5));

    let err = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::WaitTimeout { attempts: 2, .. }));
    assert!(!err.is_remote());
    assert_eq!(
        err.to_string(),
        "User alice was created but is still not visible after 2 attempts"
    );
    assert_eq!(directory.call_count("create_user"), 1);
}

#[tokio::test]
async fn test_without_wait_a_lagging_create_has_no_snapshot() {
    let directory = directory().with_visibility_lag(1);
    let ctx = store_ctx();

    let result = Reconciler::new(&ctx)
        .reconcile(&UserKind::new(&directory), &alice_spec(), State::Present)
        .await
        .unwrap();

    assert!(result.changed);
    assert!(!result.resource_id.is_empty());
    assert!(result.resource.is_none());
}

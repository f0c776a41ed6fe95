//! `idc user|group|permission-set|assignment` command implementation.

use idc_core::params::{self, Invocation};
use idc_core::{ReconcileError, ReconciliationResult, Settings};
use idc_runtime::{
    AssignmentKind, GroupKind, IdentityStoreClient, PermissionSetKind, Reconciler, ResourceKind,
    SsoAdminClient, UserKind,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    Group,
    PermissionSet,
    Assignment,
}

/// Validate `raw` for the given resource type and drive it to its desired state.
pub async fn execute<C>(
    client: &C,
    resource: ResourceType,
    raw: &Value,
    settings: &Settings,
) -> Result<ReconciliationResult, ReconcileError>
where
    C: IdentityStoreClient + SsoAdminClient + ?Sized,
{
    match resource {
        ResourceType::User => apply(&UserKind::new(client), params::parse_user(raw)?, settings).await,
        ResourceType::Group => apply(&GroupKind::new(client), params::parse_group(raw)?, settings).await,
        ResourceType::PermissionSet => {
            let invocation = params::parse_permission_set(raw)?;
            apply(&PermissionSetKind::new(client), invocation, settings).await
        }
        ResourceType::Assignment => {
            let invocation = params::parse_assignment(raw)?;
            apply(&AssignmentKind::new(client), invocation, settings).await
        }
    }
}

async fn apply<K: ResourceKind>(
    kind: &K,
    invocation: Invocation<K::Desired>,
    settings: &Settings,
) -> Result<ReconciliationResult, ReconcileError> {
    let ctx = invocation.context(settings)?;
    Reconciler::new(&ctx)
        .reconcile(kind, &invocation.desired, invocation.control.state)
        .await
}

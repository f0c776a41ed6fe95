//! Per-kind capabilities plugged into the generic reconciler.

use crate::diff::Diff;
use async_trait::async_trait;
use idc_core::convert::{self, Convention};
use idc_core::{AssignmentStatus, ClientError, DiffPolicy};
use serde::Serialize;
use serde_json::Value;

mod assignment;
mod group;
mod permission_set;
mod user;

pub use assignment::AssignmentKind;
pub use group::GroupKind;
pub use permission_set::PermissionSetKind;
pub use user::UserKind;

/// What a create call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Created {
    /// Server-assigned id, empty for kinds without one.
    pub id: String,
    /// Request status for asynchronous creates.
    pub status: Option<AssignmentStatus>,
}

/// What a delete call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deleted {
    pub status: Option<AssignmentStatus>,
}

/// One reconcilable resource kind.
///
/// `scope` is the identity store id for users and groups and the instance ARN
/// for permission sets and assignments.
#[async_trait]
pub trait ResourceKind: Send + Sync {
    type Desired: Send + Sync;
    type Remote: Serialize + Send + Sync;

    /// Human-readable type name used in messages.
    fn label(&self) -> &'static str;

    fn natural_key(&self, desired: &Self::Desired) -> String;

    fn remote_id(&self, remote: &Self::Remote) -> String;

    async fn locate(&self, scope: &str, desired: &Self::Desired) -> Result<Option<Self::Remote>, ClientError>;

    fn diff(&self, current: &Self::Remote, desired: &Self::Desired, policy: DiffPolicy) -> Diff;

    async fn create(&self, scope: &str, desired: &Self::Desired) -> Result<Created, ClientError>;

    async fn update(
        &self,
        scope: &str,
        current: &Self::Remote,
        desired: &Self::Desired,
        diff: &Diff,
    ) -> Result<(), ClientError>;

    async fn delete(&self, scope: &str, current: &Self::Remote) -> Result<Deleted, ClientError>;

    /// Result snapshot with snake_case keys.
    fn snapshot(&self, remote: &Self::Remote) -> Value {
        let value = serde_json::to_value(remote).unwrap_or(Value::Null);
        convert::normalize(&value, Convention::Snake)
    }
}

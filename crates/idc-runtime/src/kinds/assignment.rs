use super::{Created, Deleted, ResourceKind};
use crate::adapter::SsoAdminClient;
use crate::diff::Diff;
use crate::locator;
use async_trait::async_trait;
use idc_core::{AccountAssignment, AssignmentSpec, ClientError, DiffPolicy};

/// Account assignments, keyed by their full tuple. They have no mutable
/// attributes, so the diff is always empty and update is never reached.
pub struct AssignmentKind<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> AssignmentKind<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C> ResourceKind for AssignmentKind<'a, C>
where
    C: SsoAdminClient + ?Sized,
{
    type Desired = AssignmentSpec;
    type Remote = AccountAssignment;

    fn label(&self) -> &'static str {
        "Assignment"
    }

    fn natural_key(&self, desired: &AssignmentSpec) -> String {
        desired.to_string()
    }

    fn remote_id(&self, _remote: &AccountAssignment) -> String {
        String::new()
    }

    async fn locate(&self, scope: &str, desired: &AssignmentSpec) -> Result<Option<AccountAssignment>, ClientError> {
        locator::locate_assignment(self.client, scope, desired).await
    }

    fn diff(&self, _current: &AccountAssignment, _desired: &AssignmentSpec, _policy: DiffPolicy) -> Diff {
        Diff::default()
    }

    async fn create(&self, scope: &str, desired: &AssignmentSpec) -> Result<Created, ClientError> {
        let status = self.client.create_account_assignment(scope, desired).await?;
        Ok(Created {
            id: String::new(),
            status: Some(status),
        })
    }

    async fn update(
        &self,
        _scope: &str,
        _current: &AccountAssignment,
        _desired: &AssignmentSpec,
        _diff: &Diff,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    async fn delete(&self, scope: &str, current: &AccountAssignment) -> Result<Deleted, ClientError> {
        let spec = AssignmentSpec {
            target_id: current.account_id.clone(),
            target_type: Default::default(),
            permission_set_arn: current.permission_set_arn.clone(),
            principal_type: current.principal_type,
            principal_id: current.principal_id.clone(),
        };
        let status = self.client.delete_account_assignment(scope, &spec).await?;
        Ok(Deleted { status: Some(status) })
    }
}

use super::{Created, Deleted, ResourceKind};
use crate::adapter::IdentityStoreClient;
use crate::diff::{self, Diff};
use crate::locator;
use async_trait::async_trait;
use idc_core::{ClientError, DiffPolicy, Group, GroupSpec};

/// Groups keyed by display name within an identity store.
pub struct GroupKind<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> GroupKind<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C> ResourceKind for GroupKind<'a, C>
where
    C: IdentityStoreClient + ?Sized,
{
    type Desired = GroupSpec;
    type Remote = Group;

    fn label(&self) -> &'static str {
        "Group"
    }

    fn natural_key(&self, desired: &GroupSpec) -> String {
        desired.display_name.clone()
    }

    fn remote_id(&self, remote: &Group) -> String {
        remote.group_id.clone()
    }

    async fn locate(&self, scope: &str, desired: &GroupSpec) -> Result<Option<Group>, ClientError> {
        locator::locate_group(self.client, scope, &desired.display_name).await
    }

    fn diff(&self, current: &Group, desired: &GroupSpec, policy: DiffPolicy) -> Diff {
        diff::diff_group(current, desired, policy)
    }

    async fn create(&self, scope: &str, desired: &GroupSpec) -> Result<Created, ClientError> {
        let id = self.client.create_group(scope, desired).await?;
        Ok(Created { id, status: None })
    }

    async fn update(&self, scope: &str, current: &Group, _desired: &GroupSpec, diff: &Diff) -> Result<(), ClientError> {
        self.client
            .update_group(scope, &current.group_id, &diff.operations)
            .await
    }

    async fn delete(&self, scope: &str, current: &Group) -> Result<Deleted, ClientError> {
        self.client.delete_group(scope, &current.group_id).await?;
        Ok(Deleted::default())
    }
}

use super::{Created, Deleted, ResourceKind};
use crate::adapter::IdentityStoreClient;
use crate::diff::{self, Diff};
use crate::locator;
use async_trait::async_trait;
use idc_core::{ClientError, DiffPolicy, User, UserSpec};

/// Users keyed by user name within an identity store.
pub struct UserKind<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> UserKind<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C> ResourceKind for UserKind<'a, C>
where
    C: IdentityStoreClient + ?Sized,
{
    type Desired = UserSpec;
    type Remote = User;

    fn label(&self) -> &'static str {
        "User"
    }

    fn natural_key(&self, desired: &UserSpec) -> String {
        desired.user_name.clone()
    }

    fn remote_id(&self, remote: &User) -> String {
        remote.user_id.clone()
    }

    async fn locate(&self, scope: &str, desired: &UserSpec) -> Result<Option<User>, ClientError> {
        locator::locate_user(self.client, scope, &desired.user_name).await
    }

    fn diff(&self, current: &User, desired: &UserSpec, policy: DiffPolicy) -> Diff {
        let diff = diff::diff_user(current, desired, policy);
        let blind = unreadable_enterprise_paths(current, &diff);
        if !blind.is_empty() {
            tracing::debug!(
                user = %desired.user_name,
                paths = ?blind,
                "enterprise attributes are not reported back by the directory; re-sending them"
            );
        }
        diff
    }

    async fn create(&self, scope: &str, desired: &UserSpec) -> Result<Created, ClientError> {
        let id = self.client.create_user(scope, desired).await?;
        Ok(Created { id, status: None })
    }

    async fn update(&self, scope: &str, current: &User, _desired: &UserSpec, diff: &Diff) -> Result<(), ClientError> {
        self.client
            .update_user(scope, &current.user_id, &diff.operations)
            .await
    }

    async fn delete(&self, scope: &str, current: &User) -> Result<Deleted, ClientError> {
        self.client.delete_user(scope, &current.user_id).await?;
        Ok(Deleted::default())
    }
}

/// Enterprise paths in `diff` that were emitted only because the directory
/// returned no enterprise attributes to compare against.
fn unreadable_enterprise_paths<'d>(current: &User, diff: &'d Diff) -> Vec<&'d str> {
    if current.enterprise.is_some() {
        return Vec::new();
    }
    diff.paths()
        .into_iter()
        .filter(|path| path.starts_with("enterprise."))
        .collect()
}

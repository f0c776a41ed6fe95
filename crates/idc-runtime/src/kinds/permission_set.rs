use super::{Created, Deleted, ResourceKind};
use crate::adapter::SsoAdminClient;
use crate::diff::{self, Diff};
use crate::locator;
use async_trait::async_trait;
use idc_core::convert::{self, Convention};
use idc_core::{ClientError, DiffPolicy, PermissionSet, PermissionSetAttributes, PermissionSetSpec};
use serde_json::Value;
use std::collections::BTreeSet;

/// Permission sets keyed by name within an instance.
///
/// One logical create or update fans out into the permission set call plus
/// the managed-policy and inline-policy calls.
pub struct PermissionSetKind<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> PermissionSetKind<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

impl<'a, C> PermissionSetKind<'a, C>
where
    C: SsoAdminClient + ?Sized,
{
    async fn put_inline(&self, instance_arn: &str, arn: &str, document: &Value) -> Result<(), ClientError> {
        let document = match document {
            Value::String(raw) => raw.clone(),
            other => serde_json::to_string(other).map_err(|err| ClientError::Api(err.to_string()))?,
        };
        self.client.put_inline_policy(instance_arn, arn, &document).await
    }
}

#[async_trait]
impl<'a, C> ResourceKind for PermissionSetKind<'a, C>
where
    C: SsoAdminClient + ?Sized,
{
    type Desired = PermissionSetSpec;
    type Remote = PermissionSet;

    fn label(&self) -> &'static str {
        "Permission set"
    }

    fn natural_key(&self, desired: &PermissionSetSpec) -> String {
        desired.name.clone()
    }

    fn remote_id(&self, remote: &PermissionSet) -> String {
        remote.permission_set_arn.clone()
    }

    async fn locate(&self, scope: &str, desired: &PermissionSetSpec) -> Result<Option<PermissionSet>, ClientError> {
        locator::locate_permission_set(self.client, scope, &desired.name).await
    }

    fn diff(&self, current: &PermissionSet, desired: &PermissionSetSpec, policy: DiffPolicy) -> Diff {
        diff::diff_permission_set(current, desired, policy)
    }

    async fn create(&self, scope: &str, desired: &PermissionSetSpec) -> Result<Created, ClientError> {
        let arn = self.client.create_permission_set(scope, desired).await?;

        for policy_arn in desired.managed_policies.iter().flatten() {
            self.client.attach_managed_policy(scope, &arn, policy_arn).await?;
        }
        if let Some(document) = &desired.inline_policy {
            self.put_inline(scope, &arn, document).await?;
        }

        Ok(Created { id: arn, status: None })
    }

    async fn update(
        &self,
        scope: &str,
        current: &PermissionSet,
        desired: &PermissionSetSpec,
        diff: &Diff,
    ) -> Result<(), ClientError> {
        let arn = &current.permission_set_arn;

        let pick = |path: &str, value: &Option<String>| {
            if diff.touches(path) { value.clone() } else { None }
        };
        let attributes = PermissionSetAttributes {
            description: pick("description", &desired.description),
            session_duration: pick("sessionDuration", &desired.session_duration),
            relay_state: pick("relayState", &desired.relay_state),
        };
        if !attributes.is_empty() {
            self.client.update_permission_set(scope, arn, &attributes).await?;
        }

        if diff.touches("managedPolicies") {
            let want: BTreeSet<&str> = desired.managed_policies.iter().flatten().map(String::as_str).collect();
            let have: BTreeSet<&str> = current.managed_policies.iter().map(String::as_str).collect();

            for policy_arn in want.difference(&have) {
                self.client.attach_managed_policy(scope, arn, policy_arn).await?;
            }
            for policy_arn in have.difference(&want) {
                self.client.detach_managed_policy(scope, arn, policy_arn).await?;
            }
        }

        if diff.touches("inlinePolicy") {
            if let Some(document) = &desired.inline_policy {
                self.put_inline(scope, arn, document).await?;
            }
        }

        Ok(())
    }

    async fn delete(&self, scope: &str, current: &PermissionSet) -> Result<Deleted, ClientError> {
        self.client
            .delete_permission_set(scope, &current.permission_set_arn)
            .await?;
        Ok(Deleted::default())
    }

    /// Snake_case snapshot. The inline policy document keeps its own keys.
    fn snapshot(&self, remote: &PermissionSet) -> Value {
        let value = serde_json::to_value(remote).unwrap_or(Value::Null);
        let mut snapshot = convert::normalize(&value, Convention::Snake);
        if let (Value::Object(map), Some(document)) = (&mut snapshot, &remote.inline_policy) {
            map.insert("inline_policy".to_string(), document.clone());
        }
        snapshot
    }
}

//! Resource locator.
//!
//! Finds at most one remote resource by natural key. Matching is always an
//! exact string comparison on the key field, even when the server already
//! filtered the listing.

use crate::adapter::{AttributeFilter, IdentityStoreClient, SsoAdminClient};
use crate::pagination::{collect_all, find_first};
use idc_core::{AccountAssignment, AssignmentSpec, ClientError, Group, PermissionSet, User};
use serde_json::Value;

/// Find a user by user name.
pub async fn locate_user<C>(client: &C, identity_store_id: &str, user_name: &str) -> Result<Option<User>, ClientError>
where
    C: IdentityStoreClient + ?Sized,
{
    let filter = AttributeFilter::new("UserName", user_name);
    let filter = &filter;

    find_first(
        move |token| client.list_users(identity_store_id, Some(filter), token),
        |user: &User| user.user_name.as_deref() == Some(user_name),
    )
    .await
}

/// Find a group by display name.
pub async fn locate_group<C>(client: &C, identity_store_id: &str, display_name: &str) -> Result<Option<Group>, ClientError>
where
    C: IdentityStoreClient + ?Sized,
{
    let filter = AttributeFilter::new("DisplayName", display_name);
    let filter = &filter;

    find_first(
        move |token| client.list_groups(identity_store_id, Some(filter), token),
        |group: &Group| group.display_name.as_deref() == Some(display_name),
    )
    .await
}

/// Find a permission set by name and attach its policies.
///
/// The SSO admin API has no name filter, so every ARN is described in
/// pagination order until one matches.
pub async fn locate_permission_set<C>(
    client: &C,
    instance_arn: &str,
    name: &str,
) -> Result<Option<PermissionSet>, ClientError>
where
    C: SsoAdminClient + ?Sized,
{
    let mut token = None;

    loop {
        let page = client.list_permission_sets(instance_arn, token.take()).await?;

        for arn in &page.items {
            let described = client.describe_permission_set(instance_arn, arn).await?;
            if described.name == name {
                return Ok(Some(attach_policies(client, instance_arn, described).await?));
            }
        }

        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(None),
        }
    }
}

async fn attach_policies<C>(
    client: &C,
    instance_arn: &str,
    mut permission_set: PermissionSet,
) -> Result<PermissionSet, ClientError>
where
    C: SsoAdminClient + ?Sized,
{
    let arn = permission_set.permission_set_arn.clone();
    let arn = arn.as_str();

    permission_set.managed_policies =
        collect_all(move |token| client.list_managed_policies(instance_arn, arn, token)).await?;
    permission_set.inline_policy = fetch_inline_policy(client, instance_arn, arn).await?;

    Ok(permission_set)
}

/// Inline policy document of a permission set, `None` when it has none.
///
/// A `NotFound` from the service and an empty document both mean "no inline
/// policy". A document that is not valid JSON is returned as a string.
pub async fn fetch_inline_policy<C>(
    client: &C,
    instance_arn: &str,
    permission_set_arn: &str,
) -> Result<Option<Value>, ClientError>
where
    C: SsoAdminClient + ?Sized,
{
    let raw = match client.get_inline_policy(instance_arn, permission_set_arn).await {
        Ok(raw) => raw,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw))))
}

/// Find an account assignment by its full tuple.
///
/// The listing is scoped server-side by instance, account and permission set;
/// principal type and id are matched here.
pub async fn locate_assignment<C>(
    client: &C,
    instance_arn: &str,
    spec: &AssignmentSpec,
) -> Result<Option<AccountAssignment>, ClientError>
where
    C: SsoAdminClient + ?Sized,
{
    let account_id = spec.target_id.as_str();
    let permission_set_arn = spec.permission_set_arn.as_str();

    find_first(
        move |token| client.list_account_assignments(instance_arn, account_id, permission_set_arn, token),
        |assignment: &AccountAssignment| spec.matches(assignment),
    )
    .await
}

/// Identity store id behind an Identity Center instance.
pub async fn resolve_identity_store_id<C>(client: &C, instance_arn: &str) -> Result<Option<String>, ClientError>
where
    C: SsoAdminClient + ?Sized,
{
    let instance = find_first(
        move |token| client.list_instances(token),
        |instance: &idc_core::Instance| instance.instance_arn == instance_arn,
    )
    .await?;

    Ok(instance.map(|i| i.identity_store_id))
}

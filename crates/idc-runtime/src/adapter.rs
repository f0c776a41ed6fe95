//! Remote directory client boundary.
//!
//! The reconciler never talks to AWS directly. Everything it needs from the
//! identity store and the SSO admin service goes through these two traits, so
//! the production SDK client and the in-memory directory used by tests are
//! interchangeable.

use async_trait::async_trait;
use idc_core::{
    AccountAssignment, AssignmentSpec, AssignmentStatus, ChangeOperation, ClientError, Group,
    GroupSpec, Instance, PermissionSet, PermissionSetAttributes, PermissionSetSpec, User, UserSpec,
};

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Server-side exact-match filter on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    /// `UserName` for users, `DisplayName` for groups.
    pub attribute_path: String,
    pub attribute_value: String,
}

impl AttributeFilter {
    pub fn new(attribute_path: impl Into<String>, attribute_value: impl Into<String>) -> Self {
        Self {
            attribute_path: attribute_path.into(),
            attribute_value: attribute_value.into(),
        }
    }
}

/// Identity store operations (users and groups).
#[async_trait]
pub trait IdentityStoreClient: Send + Sync {
    async fn list_users(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<User>, ClientError>;

    /// Create a user and return its server-assigned id.
    async fn create_user(&self, identity_store_id: &str, user: &UserSpec) -> Result<String, ClientError>;

    /// Apply attribute operations in one call.
    async fn update_user(
        &self,
        identity_store_id: &str,
        user_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError>;

    async fn delete_user(&self, identity_store_id: &str, user_id: &str) -> Result<(), ClientError>;

    async fn list_groups(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<Group>, ClientError>;

    /// Create a group and return its server-assigned id.
    async fn create_group(&self, identity_store_id: &str, group: &GroupSpec) -> Result<String, ClientError>;

    async fn update_group(
        &self,
        identity_store_id: &str,
        group_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError>;

    async fn delete_group(&self, identity_store_id: &str, group_id: &str) -> Result<(), ClientError>;
}

/// SSO admin operations (instances, permission sets, account assignments).
#[async_trait]
pub trait SsoAdminClient: Send + Sync {
    async fn list_instances(&self, next_token: Option<String>) -> Result<Page<Instance>, ClientError>;

    /// List permission set ARNs of an instance.
    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError>;

    /// Describe one permission set. Policy attachments are not included.
    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet, ClientError>;

    /// List ARNs of AWS managed policies attached to a permission set.
    async fn list_managed_policies(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError>;

    /// Raw inline policy document. May fail with `NotFound` or return an
    /// empty string when the permission set has none.
    async fn get_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<String, ClientError>;

    /// Create a permission set (with tags) and return its ARN.
    async fn create_permission_set(
        &self,
        instance_arn: &str,
        spec: &PermissionSetSpec,
    ) -> Result<String, ClientError>;

    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        attributes: &PermissionSetAttributes,
    ) -> Result<(), ClientError>;

    async fn attach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError>;

    async fn detach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError>;

    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        document: &str,
    ) -> Result<(), ClientError>;

    async fn delete_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<(), ClientError>;

    /// List assignments of one permission set on one account.
    async fn list_account_assignments(
        &self,
        instance_arn: &str,
        account_id: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<AccountAssignment>, ClientError>;

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError>;

    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError>;
}

//! In-memory directory.
//!
//! Implements both client traits over a mutex-guarded store. Used by the
//! test-suites to count calls, inject failures, page listings and simulate
//! eventual consistency after creates.

use crate::adapter::{AttributeFilter, IdentityStoreClient, Page, SsoAdminClient};
use async_trait::async_trait;
use chrono::Utc;
use idc_core::convert::{self, Convention};
use idc_core::{
    AccountAssignment, AssignmentSpec, AssignmentStatus, ChangeOperation, ClientError, Group,
    GroupSpec, Instance, PermissionSet, PermissionSetAttributes, PermissionSetSpec, User, UserSpec,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Calls that change remote state.
const MUTATING: &[&str] = &[
    "create_user",
    "update_user",
    "delete_user",
    "create_group",
    "update_group",
    "delete_group",
    "create_permission_set",
    "update_permission_set",
    "attach_managed_policy",
    "detach_managed_policy",
    "put_inline_policy",
    "delete_permission_set",
    "create_account_assignment",
    "delete_account_assignment",
];

struct Entry<T> {
    scope: String,
    item: T,
    /// First-page listings left before the entry shows up.
    hidden: u32,
}

#[derive(Default)]
struct Store {
    instances: Vec<Instance>,
    users: Vec<Entry<User>>,
    groups: Vec<Entry<Group>>,
    /// Policies live on the item; the inline document is kept raw.
    permission_sets: Vec<Entry<PermissionSet>>,
    assignments: Vec<Entry<AccountAssignment>>,
    calls: Vec<String>,
    failures: HashMap<String, ClientError>,
}

pub struct InMemoryDirectory {
    store: Mutex<Store>,
    page_size: usize,
    visibility_lag: u32,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            page_size: DEFAULT_PAGE_SIZE,
            visibility_lag: 0,
        }
    }

    /// Serve listings in pages of `page_size` items.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Keep created resources out of the next `lag` first-page listings.
    pub fn with_visibility_lag(mut self, lag: u32) -> Self {
        self.visibility_lag = lag;
        self
    }

    pub fn with_instance(self, instance_arn: &str, identity_store_id: &str) -> Self {
        self.lock().instances.push(Instance {
            instance_arn: instance_arn.to_string(),
            identity_store_id: identity_store_id.to_string(),
        });
        self
    }

    /// Make every call to `method` fail with `error`.
    pub fn fail_on(&self, method: &str, error: ClientError) {
        self.lock().failures.insert(method.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn seed_user(&self, user: User) {
        let scope = user.identity_store_id.clone();
        self.lock().users.push(Entry { scope, item: user, hidden: 0 });
    }

    pub fn seed_group(&self, group: Group) {
        let scope = group.identity_store_id.clone();
        self.lock().groups.push(Entry { scope, item: group, hidden: 0 });
    }

    /// Seed a permission set. A JSON inline policy is stored as its compact text.
    pub fn seed_permission_set(&self, instance_arn: &str, mut permission_set: PermissionSet) {
        permission_set.inline_policy = permission_set.inline_policy.map(|doc| match doc {
            Value::String(raw) => Value::String(raw),
            other => Value::String(other.to_string()),
        });
        self.lock().permission_sets.push(Entry {
            scope: instance_arn.to_string(),
            item: permission_set,
            hidden: 0,
        });
    }

    pub fn seed_assignment(&self, instance_arn: &str, assignment: AccountAssignment) {
        self.lock().assignments.push(Entry {
            scope: instance_arn.to_string(),
            item: assignment,
            hidden: 0,
        });
    }

    /// Every client call so far, by method name.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|call| *call == method).count()
    }

    /// Number of calls that would have changed remote state.
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| MUTATING.contains(&call.as_str()))
            .count()
    }

    pub fn user(&self, user_name: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|e| e.item.user_name.as_deref() == Some(user_name))
            .map(|e| e.item.clone())
    }

    pub fn group(&self, display_name: &str) -> Option<Group> {
        self.lock()
            .groups
            .iter()
            .find(|e| e.item.display_name.as_deref() == Some(display_name))
            .map(|e| e.item.clone())
    }

    /// Stored permission set with its policies; the inline document stays raw text.
    pub fn permission_set(&self, name: &str) -> Option<PermissionSet> {
        self.lock()
            .permission_sets
            .iter()
            .find(|e| e.item.name == name)
            .map(|e| e.item.clone())
    }

    pub fn assignments(&self) -> Vec<AccountAssignment> {
        self.lock().assignments.iter().map(|e| e.item.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and return the store, or the injected failure.
    fn enter(&self, method: &str) -> Result<MutexGuard<'_, Store>, ClientError> {
        let mut store = self.lock();
        store.calls.push(method.to_string());
        if let Some(err) = store.failures.get(method).cloned() {
            return Err(err);
        }
        Ok(store)
    }

    fn paginate<T: Clone>(&self, items: Vec<T>, next_token: Option<String>) -> Result<Page<T>, ClientError> {
        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ClientError::Api(format!("invalid next token: {token}")))?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());

        Ok(Page {
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            next_token,
        })
    }
}

fn visible<T: Clone>(
    entries: &mut [Entry<T>],
    scope: &str,
    first_page: bool,
    keep: impl Fn(&T) -> bool,
) -> Vec<T> {
    let items = entries
        .iter()
        .filter(|e| e.scope == scope && e.hidden == 0 && keep(&e.item))
        .map(|e| e.item.clone())
        .collect();

    if first_page {
        for entry in entries.iter_mut().filter(|e| e.scope == scope) {
            entry.hidden = entry.hidden.saturating_sub(1);
        }
    }
    items
}

fn filter_matches(filter: Option<&AttributeFilter>, path: &str, value: Option<&str>) -> bool {
    match filter {
        Some(filter) if filter.attribute_path == path => value == Some(filter.attribute_value.as_str()),
        _ => true,
    }
}

/// Apply camelCase attribute operations to a PascalCase-serialized item.
fn apply_operations<T>(item: &T, operations: &[ChangeOperation]) -> Result<T, ClientError>
where
    T: Serialize + DeserializeOwned,
{
    let mut tree = serde_json::to_value(item).map_err(|err| ClientError::Api(err.to_string()))?;

    for operation in operations {
        let path: Vec<String> = operation
            .attribute_path
            .split('.')
            .map(|segment| Convention::Pascal.convert(segment))
            .collect();
        set_path(&mut tree, &path, convert::normalize(&operation.value, Convention::Pascal));
    }

    serde_json::from_value(tree)
        .map_err(|err| ClientError::Api(format!("ValidationException: {err}")))
}

fn set_path(tree: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = tree;
    for segment in parents {
        if let Value::Object(map) = &mut *node {
            if !map.get(segment).is_some_and(Value::is_object) {
                map.insert(segment.clone(), Value::Object(Map::new()));
            }
        }
        node = match node.get_mut(segment.as_str()) {
            Some(child) => child,
            None => return,
        };
    }

    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

fn permission_set_arn(instance_arn: &str) -> String {
    let instance_id = instance_arn.rsplit('/').next().unwrap_or(instance_arn);
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(16).collect();
    format!("arn:aws:sso:::permissionSet/{instance_id}/ps-{suffix}")
}

fn request_status() -> AssignmentStatus {
    AssignmentStatus {
        status: "IN_PROGRESS".to_string(),
        request_id: Some(Uuid::new_v4().to_string()),
        failure_reason: None,
    }
}

#[async_trait]
impl IdentityStoreClient for InMemoryDirectory {
    async fn list_users(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<User>, ClientError> {
        let first_page = next_token.is_none();
        let items = {
            let mut store = self.enter("list_users")?;
            visible(&mut store.users, identity_store_id, first_page, |user| {
                filter_matches(filter, "UserName", user.user_name.as_deref())
            })
        };
        self.paginate(items, next_token)
    }

    async fn create_user(&self, identity_store_id: &str, user: &UserSpec) -> Result<String, ClientError> {
        let mut store = self.enter("create_user")?;
        let taken = store
            .users
            .iter()
            .any(|e| e.scope == identity_store_id && e.item.user_name.as_deref() == Some(user.user_name.as_str()));
        if taken {
            return Err(ClientError::Api(format!(
                "ConflictException: user name {} already exists",
                user.user_name
            )));
        }

        let user_id = Uuid::new_v4().to_string();
        store.users.push(Entry {
            scope: identity_store_id.to_string(),
            item: User::from_spec(user_id.clone(), identity_store_id, user),
            hidden: self.visibility_lag,
        });
        Ok(user_id)
    }

    async fn update_user(
        &self,
        identity_store_id: &str,
        user_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError> {
        let mut store = self.enter("update_user")?;
        let entry = store
            .users
            .iter_mut()
            .find(|e| e.scope == identity_store_id && e.item.user_id == user_id)
            .ok_or_else(|| ClientError::NotFound(format!("user {user_id}")))?;
        let mut updated: User = apply_operations(&entry.item, operations)?;
        updated.canonicalize_primaries();
        entry.item = updated;
        Ok(())
    }

    async fn delete_user(&self, identity_store_id: &str, user_id: &str) -> Result<(), ClientError> {
        let mut store = self.enter("delete_user")?;
        let before = store.users.len();
        store
            .users
            .retain(|e| !(e.scope == identity_store_id && e.item.user_id == user_id));
        if store.users.len() == before {
            return Err(ClientError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn list_groups(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<Group>, ClientError> {
        let first_page = next_token.is_none();
        let items = {
            let mut store = self.enter("list_groups")?;
            visible(&mut store.groups, identity_store_id, first_page, |group| {
                filter_matches(filter, "DisplayName", group.display_name.as_deref())
            })
        };
        self.paginate(items, next_token)
    }

    async fn create_group(&self, identity_store_id: &str, group: &GroupSpec) -> Result<String, ClientError> {
        let mut store = self.enter("create_group")?;
        let group_id = Uuid::new_v4().to_string();
        store.groups.push(Entry {
            scope: identity_store_id.to_string(),
            item: Group {
                group_id: group_id.clone(),
                identity_store_id: identity_store_id.to_string(),
                display_name: Some(group.display_name.clone()),
                description: group.description.clone(),
            },
            hidden: self.visibility_lag,
        });
        Ok(group_id)
    }

    async fn update_group(
        &self,
        identity_store_id: &str,
        group_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError> {
        let mut store = self.enter("update_group")?;
        let entry = store
            .groups
            .iter_mut()
            .find(|e| e.scope == identity_store_id && e.item.group_id == group_id)
            .ok_or_else(|| ClientError::NotFound(format!("group {group_id}")))?;
        entry.item = apply_operations(&entry.item, operations)?;
        Ok(())
    }

    async fn delete_group(&self, identity_store_id: &str, group_id: &str) -> Result<(), ClientError> {
        let mut store = self.enter("delete_group")?;
        let before = store.groups.len();
        store
            .groups
            .retain(|e| !(e.scope == identity_store_id && e.item.group_id == group_id));
        if store.groups.len() == before {
            return Err(ClientError::NotFound(format!("group {group_id}")));
        }
        Ok(())
    }
}

impl InMemoryDirectory {
    fn with_permission_set<R>(
        &self,
        method: &str,
        instance_arn: &str,
        permission_set_arn: &str,
        apply: impl FnOnce(&mut PermissionSet) -> R,
    ) -> Result<R, ClientError> {
        let mut store = self.enter(method)?;
        let entry = store
            .permission_sets
            .iter_mut()
            .find(|e| e.scope == instance_arn && e.item.permission_set_arn == permission_set_arn)
            .ok_or_else(|| ClientError::NotFound(format!("permission set {permission_set_arn}")))?;
        Ok(apply(&mut entry.item))
    }
}

#[async_trait]
impl SsoAdminClient for InMemoryDirectory {
    async fn list_instances(&self, next_token: Option<String>) -> Result<Page<Instance>, ClientError> {
        let items = self.enter("list_instances")?.instances.clone();
        self.paginate(items, next_token)
    }

    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let first_page = next_token.is_none();
        let items = {
            let mut store = self.enter("list_permission_sets")?;
            visible(&mut store.permission_sets, instance_arn, first_page, |_| true)
                .into_iter()
                .map(|ps| ps.permission_set_arn)
                .collect()
        };
        self.paginate(items, next_token)
    }

    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet, ClientError> {
        self.with_permission_set("describe_permission_set", instance_arn, permission_set_arn, |ps| {
            PermissionSet {
                managed_policies: Vec::new(),
                inline_policy: None,
                ..ps.clone()
            }
        })
    }

    async fn list_managed_policies(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let items = self.with_permission_set("list_managed_policies", instance_arn, permission_set_arn, |ps| {
            ps.managed_policies.clone()
        })?;
        self.paginate(items, next_token)
    }

    async fn get_inline_policy(&self, instance_arn: &str, permission_set_arn: &str) -> Result<String, ClientError> {
        let document = self.with_permission_set("get_inline_policy", instance_arn, permission_set_arn, |ps| {
            ps.inline_policy.clone()
        })?;
        match document {
            Some(Value::String(raw)) => Ok(raw),
            Some(other) => Ok(other.to_string()),
            None => Err(ClientError::NotFound(format!("inline policy of {permission_set_arn}"))),
        }
    }

    async fn create_permission_set(&self, instance_arn: &str, spec: &PermissionSetSpec) -> Result<String, ClientError> {
        let mut store = self.enter("create_permission_set")?;
        if store
            .permission_sets
            .iter()
            .any(|e| e.scope == instance_arn && e.item.name == spec.name)
        {
            return Err(ClientError::Api(format!(
                "ConflictException: permission set {} already exists",
                spec.name
            )));
        }

        let arn = permission_set_arn(instance_arn);
        store.permission_sets.push(Entry {
            scope: instance_arn.to_string(),
            item: PermissionSet {
                permission_set_arn: arn.clone(),
                name: spec.name.clone(),
                description: spec.description.clone(),
                session_duration: spec.session_duration.clone(),
                relay_state: spec.relay_state.clone(),
                created_date: Some(Utc::now()),
                managed_policies: Vec::new(),
                inline_policy: None,
            },
            hidden: self.visibility_lag,
        });
        Ok(arn)
    }

    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        attributes: &PermissionSetAttributes,
    ) -> Result<(), ClientError> {
        self.with_permission_set("update_permission_set", instance_arn, permission_set_arn, |ps| {
            if let Some(description) = &attributes.description {
                ps.description = Some(description.clone());
            }
            if let Some(duration) = &attributes.session_duration {
                ps.session_duration = Some(duration.clone());
            }
            if let Some(relay_state) = &attributes.relay_state {
                ps.relay_state = Some(relay_state.clone());
            }
        })
    }

    async fn attach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError> {
        let attached = self.with_permission_set("attach_managed_policy", instance_arn, permission_set_arn, |ps| {
            if ps.managed_policies.iter().any(|p| p == policy_arn) {
                false
            } else {
                ps.managed_policies.push(policy_arn.to_string());
                true
            }
        })?;
        if !attached {
            return Err(ClientError::Api(format!("ConflictException: {policy_arn} is already attached")));
        }
        Ok(())
    }

    async fn detach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError> {
        let detached = self.with_permission_set("detach_managed_policy", instance_arn, permission_set_arn, |ps| {
            let before = ps.managed_policies.len();
            ps.managed_policies.retain(|p| p != policy_arn);
            ps.managed_policies.len() != before
        })?;
        if !detached {
            return Err(ClientError::NotFound(format!("managed policy {policy_arn}")));
        }
        Ok(())
    }

    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        document: &str,
    ) -> Result<(), ClientError> {
        self.with_permission_set("put_inline_policy", instance_arn, permission_set_arn, |ps| {
            ps.inline_policy = Some(Value::String(document.to_string()));
        })
    }

    async fn delete_permission_set(&self, instance_arn: &str, permission_set_arn: &str) -> Result<(), ClientError> {
        let mut store = self.enter("delete_permission_set")?;
        let before = store.permission_sets.len();
        store
            .permission_sets
            .retain(|e| !(e.scope == instance_arn && e.item.permission_set_arn == permission_set_arn));
        if store.permission_sets.len() == before {
            return Err(ClientError::NotFound(format!("permission set {permission_set_arn}")));
        }
        Ok(())
    }

    async fn list_account_assignments(
        &self,
        instance_arn: &str,
        account_id: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<AccountAssignment>, ClientError> {
        let first_page = next_token.is_none();
        let items = {
            let mut store = self.enter("list_account_assignments")?;
            visible(&mut store.assignments, instance_arn, first_page, |a| {
                a.account_id == account_id && a.permission_set_arn == permission_set_arn
            })
        };
        self.paginate(items, next_token)
    }

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError> {
        let mut store = self.enter("create_account_assignment")?;
        store.assignments.push(Entry {
            scope: instance_arn.to_string(),
            item: AccountAssignment::from(assignment),
            hidden: self.visibility_lag,
        });
        Ok(request_status())
    }

    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError> {
        let mut store = self.enter("delete_account_assignment")?;
        let before = store.assignments.len();
        store
            .assignments
            .retain(|e| !(e.scope == instance_arn && assignment.matches(&e.item)));
        if store.assignments.len() == before {
            return Err(ClientError::NotFound(format!("assignment {assignment}")));
        }
        Ok(request_status())
    }
}

//! Generic reconciler state machine.
//!
//! | observed           | desired=present | desired=absent |
//! |--------------------|-----------------|----------------|
//! | no match           | create          | no-op          |
//! | match, no diff     | no-op           | delete         |
//! | match, diff        | update          | delete         |
//!
//! One invocation performs one locate and at most one logical mutation.

use crate::kinds::ResourceKind;
use crate::result::{self, Outcome};
use crate::wait::{self, WaitError};
use idc_core::{ReconcileContext, ReconcileError, ReconciliationResult, State};

pub struct Reconciler<'a> {
    ctx: &'a ReconcileContext,
}

impl<'a> Reconciler<'a> {
    pub fn new(ctx: &'a ReconcileContext) -> Self {
        Self { ctx }
    }

    /// Drive one resource to `state`.
    pub async fn reconcile<K>(
        &self,
        kind: &K,
        desired: &K::Desired,
        state: State,
    ) -> Result<ReconciliationResult, ReconcileError>
    where
        K: ResourceKind,
    {
        let label = kind.label();
        let key = kind.natural_key(desired);
        let scope = self.ctx.scope_id.as_str();

        let current = kind
            .locate(scope, desired)
            .await
            .map_err(|source| ReconcileError::Fetch {
                kind: label,
                key: key.clone(),
                source,
            })?;

        let outcome = match (state, current) {
            (State::Present, None) => self.create(kind, desired, &key).await?,
            (State::Present, Some(current)) => self.update(kind, &current, desired, &key).await?,
            (State::Absent, Some(current)) => self.delete(kind, &current, &key).await?,
            (State::Absent, None) => {
                tracing::info!(kind = label, key = %key, action = "none", "resource already absent");
                Outcome::DoesNotExist
            }
        };

        Ok(result::normalize(label, &key, outcome))
    }

    async fn create<K: ResourceKind>(&self, kind: &K, desired: &K::Desired, key: &str) -> Result<Outcome, ReconcileError> {
        let label = kind.label();

        if self.ctx.check_mode {
            tracing::info!(kind = label, key, action = "create", check_mode = true, "would create");
            return Ok(Outcome::WouldCreate);
        }

        tracing::info!(kind = label, key, action = "create", "creating");
        let created = kind
            .create(&self.ctx.scope_id, desired)
            .await
            .map_err(|source| ReconcileError::Create {
                kind: label,
                key: key.to_string(),
                source,
            })?;

        let scope = self.ctx.scope_id.as_str();
        let located = match &self.ctx.wait {
            Some(policy) => {
                let found = wait::until_visible(policy, move || kind.locate(scope, desired))
                    .await
                    .map_err(|err| match err {
                        WaitError::Exhausted { attempts } => ReconcileError::WaitTimeout {
                            kind: label,
                            key: key.to_string(),
                            attempts,
                        },
                        WaitError::Lookup(source) => ReconcileError::Fetch {
                            kind: label,
                            key: key.to_string(),
                            source,
                        },
                    })?;
                Some(found)
            }
            None => self.refetch(kind, desired, key).await,
        };

        Ok(Outcome::Created {
            id: created.id,
            resource: located.as_ref().map(|remote| kind.snapshot(remote)),
            status: created.status.map(|s| s.status),
        })
    }

    async fn update<K: ResourceKind>(
        &self,
        kind: &K,
        current: &K::Remote,
        desired: &K::Desired,
        key: &str,
    ) -> Result<Outcome, ReconcileError> {
        let label = kind.label();
        let id = kind.remote_id(current);
        let diff = kind.diff(current, desired, self.ctx.diff_policy);

        if !diff.has_changes() {
            tracing::info!(kind = label, key, action = "none", "resource up to date");
            return Ok(Outcome::AlreadyExists { id });
        }

        if self.ctx.check_mode {
            tracing::info!(
                kind = label,
                key,
                action = "update",
                check_mode = true,
                paths = ?diff.paths(),
                "would update"
            );
            return Ok(Outcome::WouldUpdate { id });
        }

        tracing::info!(kind = label, key, action = "update", paths = ?diff.paths(), "updating");
        kind.update(&self.ctx.scope_id, current, desired, &diff)
            .await
            .map_err(|source| ReconcileError::Update {
                kind: label,
                key: key.to_string(),
                source,
            })?;

        let located = self.refetch(kind, desired, key).await;
        Ok(Outcome::Updated {
            id,
            resource: located.as_ref().map(|remote| kind.snapshot(remote)),
        })
    }

    async fn delete<K: ResourceKind>(&self, kind: &K, current: &K::Remote, key: &str) -> Result<Outcome, ReconcileError> {
        let label = kind.label();
        let id = kind.remote_id(current);

        if self.ctx.check_mode {
            tracing::info!(kind = label, key, action = "delete", check_mode = true, "would delete");
            return Ok(Outcome::WouldDelete { id });
        }

        tracing::info!(kind = label, key, action = "delete", "deleting");
        match kind.delete(&self.ctx.scope_id, current).await {
            Ok(deleted) => Ok(Outcome::Deleted {
                id,
                status: deleted.status.map(|s| s.status),
            }),
            Err(err) if err.is_not_found() => {
                tracing::info!(kind = label, key, "resource vanished before delete");
                Ok(Outcome::DoesNotExist)
            }
            Err(source) => Err(ReconcileError::Delete {
                kind: label,
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Best-effort snapshot after a mutation. The mutation already happened,
    /// so a failed lookup only drops the snapshot.
    async fn refetch<K: ResourceKind>(&self, kind: &K, desired: &K::Desired, key: &str) -> Option<K::Remote> {
        match kind.locate(&self.ctx.scope_id, desired).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(kind = kind.label(), key, error = %err, "could not fetch resource snapshot");
                None
            }
        }
    }
}

//! Read-only queries.

use crate::adapter::{AttributeFilter, IdentityStoreClient, SsoAdminClient};
use crate::locator;
use crate::pagination::collect_all;
use idc_core::convert::{self, Convention};
use idc_core::params::ListUsersArgs;
use idc_core::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Could not find Identity Store ID for instance ARN: {0}")]
    UnknownInstance(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Users of the identity store behind an instance, snake_case keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListing {
    pub changed: bool,
    pub users: Vec<Value>,
}

/// List every user of an instance, or only the one named in `args`.
pub async fn list_users<C>(client: &C, args: &ListUsersArgs) -> Result<UserListing, QueryError>
where
    C: IdentityStoreClient + SsoAdminClient + ?Sized,
{
    let identity_store_id = locator::resolve_identity_store_id(client, &args.instance_arn)
        .await?
        .ok_or_else(|| QueryError::UnknownInstance(args.instance_arn.clone()))?;
    let store = identity_store_id.as_str();

    let filter = args
        .user_name
        .as_deref()
        .map(|user_name| AttributeFilter::new("UserName", user_name));
    let filter = filter.as_ref();

    tracing::debug!(identity_store_id = store, filtered = filter.is_some(), "listing users");
    let users = collect_all(move |token| client.list_users(store, filter, token)).await?;

    let users = users
        .iter()
        .map(|user| {
            let value = serde_json::to_value(user).unwrap_or(Value::Null);
            convert::normalize(&value, Convention::Snake)
        })
        .collect();

    Ok(UserListing { changed: false, users })
}

//! `idc list-users` command implementation.

use anyhow::Result;
use idc_core::params;
use idc_runtime::{IdentityStoreClient, SsoAdminClient, UserListing, query};
use serde_json::Value;

pub async fn execute<C>(client: &C, raw: &Value) -> Result<UserListing>
where
    C: IdentityStoreClient + SsoAdminClient + ?Sized,
{
    let args = params::parse_list_users(raw)?;
    tracing::info!(instance = %args.instance_arn, user_name = ?args.user_name, "listing users");
    Ok(query::list_users(client, &args).await?)
}

//! AWS SDK backed directory client.
//!
//! [`AwsDirectory`] implements both client traits of `idc-runtime` on top of
//! the identity store and SSO admin SDK clients. SDK errors are flattened
//! into [`idc_core::ClientError`]; `ResourceNotFoundException` becomes
//! `NotFound`, everything else `Api`.

use aws_config::{BehaviorVersion, Region};

mod document;
mod error;
mod identity_store;
mod sso_admin;

pub use document::to_document;

/// Identity store and SSO admin clients sharing one SDK configuration.
#[derive(Debug, Clone)]
pub struct AwsDirectory {
    identity_store: aws_sdk_identitystore::Client,
    sso_admin: aws_sdk_ssoadmin::Client,
}

impl AwsDirectory {
    /// Load credentials and region from the environment. An explicit
    /// `region` overrides the environment.
    pub async fn connect(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.clone() {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        tracing::debug!(
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            explicit_region = region.is_some(),
            "AWS clients initialized"
        );

        Self::from_clients(
            aws_sdk_identitystore::Client::new(&sdk_config),
            aws_sdk_ssoadmin::Client::new(&sdk_config),
        )
    }

    pub fn from_clients(
        identity_store: aws_sdk_identitystore::Client,
        sso_admin: aws_sdk_ssoadmin::Client,
    ) -> Self {
        Self {
            identity_store,
            sso_admin,
        }
    }
}

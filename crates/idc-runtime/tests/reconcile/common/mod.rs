//! Shared fixtures.

use idc_core::{Email, Name, ReconcileContext, User, UserSpec};
use idc_runtime::InMemoryDirectory;

pub const STORE: &str = "d-1234567890";
pub const INSTANCE: &str = "arn:aws:sso:::instance/ssoins-1234567890abcdef";
pub const PS_ARN: &str = "arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/ps-abcdef1234567890";
pub const ACCOUNT: &str = "111122223333";

pub fn directory() -> InMemoryDirectory {
    InMemoryDirectory::new().with_instance(INSTANCE, STORE)
}

pub fn store_ctx() -> ReconcileContext {
    ReconcileContext::new(STORE)
}

pub fn instance_ctx() -> ReconcileContext {
    ReconcileContext::new(INSTANCE)
}

pub fn work_email(address: &str) -> Email {
    Email {
        value: Some(address.to_string()),
        kind: Some("work".to_string()),
        primary: Some(true),
    }
}

pub fn alice_spec() -> UserSpec {
    UserSpec {
        user_name: "alice".to_string(),
        name: Some(Name {
            given_name: Some("Alice".to_string()),
            family_name: Some("Liddell".to_string()),
            ..Name::default()
        }),
        display_name: Some("Alice Liddell".to_string()),
        emails: Some(vec![work_email("alice@example.com")]),
        ..UserSpec::default()
    }
}

/// Stored copy of `alice_spec()` under a fixed id.
pub fn alice() -> User {
    User::from_spec("u-alice", STORE, &alice_spec())
}

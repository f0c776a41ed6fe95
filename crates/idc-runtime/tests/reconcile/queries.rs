use crate::common::{alice, directory, INSTANCE, STORE};
use idc_core::params::ListUsersArgs;
use idc_core::{User, UserSpec};
use idc_runtime::query::{self, QueryError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn args(user_name: Option<&str>) -> ListUsersArgs {
    ListUsersArgs {
        instance_arn: INSTANCE.to_string(),
        user_name: user_name.map(str::to_string),
        region: None,
    }
}

#[tokio::test]
async fn test_lists_every_page_with_snake_case_keys() {
    let directory = directory().with_page_size(2);
    directory.seed_user(alice());
    for name in ["bob", "carol"] {
        directory.seed_user(User::from_spec(format!("u-{name}"), STORE, &UserSpec::new(name)));
    }

    let listing = query::list_users(&directory, &args(None)).await.unwrap();

    assert!(!listing.changed);
    assert_eq!(listing.users.len(), 3);
    assert_eq!(directory.call_count("list_users"), 2);
    assert_eq!(listing.users[0]["user_id"], json!("u-alice"));
    assert_eq!(listing.users[0]["name"]["given_name"], json!("Alice"));
    assert_eq!(listing.users[2]["user_name"], json!("carol"));
}

#[tokio::test]
async fn test_filters_by_user_name() {
    let directory = directory();
    directory.seed_user(alice());
    directory.seed_user(User::from_spec("u-bob", STORE, &UserSpec::new("bob")));

    let listing = query::list_users(&directory, &args(Some("bob"))).await.unwrap();

    assert_eq!(
        listing.users,
        vec![json!({
            "user_id": "u-bob",
            "identity_store_id": STORE,
            "user_name": "bob",
            "emails": [],
            "addresses": [],
            "phone_numbers": []
        })]
    );
}

#[tokio::test]
async fn test_unknown_instance_is_reported() {
    let directory = directory();
    let mut args = args(None);
    args.instance_arn = "arn:aws:sso:::instance/ssoins-0000000000000000".to_string();

    let err = query::list_users(&directory, &args).await.unwrap_err();

    assert!(matches!(err, QueryError::UnknownInstance(_)));
    assert_eq!(
        err.to_string(),
        "Could not find Identity Store ID for instance ARN: arn:aws:sso:::instance/ssoins-0000000000000000"
    );
    assert_eq!(directory.call_count("list_users"), 0);
}

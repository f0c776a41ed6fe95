//! Invocation parameters.
//!
//! Parameters arrive as one snake_case mapping that mixes desired-state
//! attributes with control fields (`state`, `check_mode`, `wait`, ...) and the
//! scope id. Parsing splits the two, runs the user/group attribute tree through
//! the key normalizer and validates identifiers, so the reconciler only ever
//! sees typed, well-formed specs.

use crate::config::Settings;
use crate::convert::{self, Convention};
use crate::error::ParamsError;
use crate::model::{
    AssignmentSpec, GroupSpec, PermissionSetSpec, PrincipalType, TargetType, UserSpec,
    DEFAULT_SESSION_DURATION,
};
use crate::{ReconcileContext, State};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Control fields that never reach a remote payload. `region` is handled
/// separately because addresses carry a `region` attribute of their own.
pub const CONTROL_KEYS: &[&str] = &["state", "check_mode", "wait", "wait_timeout"];

static IDENTITY_STORE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(d-[0-9a-f]{10}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$")
        .expect("identity store id pattern")
});
static INSTANCE_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws(-[a-z]+)*:sso:::instance/(sso)?ins-[a-zA-Z0-9.-]{16}$").expect("instance ARN pattern")
});
static PERMISSION_SET_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws(-[a-z]+)*:sso:::permissionSet/(sso)?ins-[a-zA-Z0-9.-]{16}/ps-[a-zA-Z0-9./-]{16}$")
        .expect("permission set ARN pattern")
});
static MANAGED_POLICY_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws(-[a-z]+)*:iam::(aws|\d{12}):policy/\S+$").expect("managed policy ARN pattern")
});
static ACCOUNT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").expect("account id pattern"));
static SESSION_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(\d+H)?(\d+M)?(\d+S)?$").expect("session duration pattern"));
static USER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}\p{S}\p{N}\p{P}]{1,128}$").expect("user name pattern"));
static PERMISSION_SET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+=,.@-]{1,32}$").expect("permission set name pattern"));

/// Control fields shared by every module.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlArgs {
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub check_mode: bool,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub wait: bool,
    /// Seconds. Falls back to the settings default when waiting.
    #[serde(default)]
    pub wait_timeout: Option<u64>,
}

/// A parsed invocation: control fields, scope and typed desired state.
#[derive(Debug, Clone)]
pub struct Invocation<S> {
    pub control: ControlArgs,
    pub scope_id: String,
    pub desired: S,
}

impl<S> Invocation<S> {
    /// Build the reconcile context, filling gaps from tool settings.
    pub fn context(&self, settings: &Settings) -> Result<ReconcileContext, ParamsError> {
        let wait = if self.control.wait {
            Some(settings.wait_policy(self.control.wait_timeout)?)
        } else {
            None
        };

        Ok(ReconcileContext::new(self.scope_id.clone())
            .with_region(self.control.region.clone().or_else(|| settings.region.clone()))
            .with_check_mode(self.control.check_mode)
            .with_wait(wait)
            .with_diff_policy(settings.diff_policy))
    }
}

/// Parameters of the read-only user listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersArgs {
    pub instance_arn: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Parse parameters of the user module.
///
/// Besides the nested tree (`name`, `emails`, `enterprise`, ...), accepts the
/// shorthands `given_name`/`family_name` (folded into `name`) and `email`
/// (expanded to a single primary work email). `display_name` defaults to
/// "<given> <family>".
pub fn parse_user(raw: &Value) -> Result<Invocation<UserSpec>, ParamsError> {
    let (control, scope_id, mut tree) = split(raw, "identity_store_id")?;
    check_pattern("identity_store_id", &scope_id, &IDENTITY_STORE_ID)?;

    let user_name = required_str(&tree, "user_name")?;
    check_pattern("user_name", &user_name, &USER_NAME)?;

    expand_user_shorthands(&mut tree);

    let normalized = convert::normalize(&convert::prune_empty(&Value::Object(tree)), Convention::Pascal);
    let mut desired: UserSpec = serde_json::from_value(normalized)?;

    check_single_primary("emails", desired.emails.iter().flatten().map(|e| e.primary))?;
    check_single_primary("addresses", desired.addresses.iter().flatten().map(|a| a.primary))?;
    check_single_primary(
        "phone_numbers",
        desired.phone_numbers.iter().flatten().map(|p| p.primary),
    )?;
    desired.canonicalize_primaries();

    Ok(Invocation {
        control,
        scope_id,
        desired,
    })
}

/// Parse parameters of the group module. The group is keyed by `name`
/// (alias `display_name`).
pub fn parse_group(raw: &Value) -> Result<Invocation<GroupSpec>, ParamsError> {
    let (control, scope_id, mut tree) = split(raw, "identity_store_id")?;
    check_pattern("identity_store_id", &scope_id, &IDENTITY_STORE_ID)?;

    if let Some(name) = tree.remove("name") {
        tree.entry("display_name").or_insert(name);
    }
    required_str(&tree, "display_name").map_err(|_| ParamsError::missing("name"))?;

    let normalized = convert::normalize(&convert::prune_empty(&Value::Object(tree)), Convention::Pascal);
    let desired: GroupSpec = serde_json::from_value(normalized)?;

    Ok(Invocation {
        control,
        scope_id,
        desired,
    })
}

#[derive(Debug, Deserialize)]
struct PermissionSetArgs {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    session_duration: Option<String>,
    #[serde(default)]
    relay_state: Option<String>,
    #[serde(default)]
    managed_policies: Option<Vec<String>>,
    #[serde(default, alias = "inline_policy_json")]
    inline_policy: Option<Value>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
}

/// Parse parameters of the permission-set module.
///
/// Tag keys are caller data, so this tree is deserialized as-is rather than
/// run through the key normalizer.
pub fn parse_permission_set(raw: &Value) -> Result<Invocation<PermissionSetSpec>, ParamsError> {
    let (control, scope_id, tree) = split(raw, "instance_arn")?;
    check_pattern("instance_arn", &scope_id, &INSTANCE_ARN)?;

    let args: PermissionSetArgs = serde_json::from_value(Value::Object(tree))?;
    check_pattern("name", &args.name, &PERMISSION_SET_NAME)?;

    let session_duration = non_empty(args.session_duration)
        .unwrap_or_else(|| DEFAULT_SESSION_DURATION.to_string());
    if session_duration == "PT" {
        return Err(ParamsError::invalid("session_duration", "duration has no components"));
    }
    check_pattern("session_duration", &session_duration, &SESSION_DURATION)?;

    let managed_policies = args.managed_policies.filter(|p| !p.is_empty());
    for arn in managed_policies.iter().flatten() {
        check_pattern("managed_policies", arn, &MANAGED_POLICY_ARN)?;
    }

    let inline_policy = match args.inline_policy {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(serde_json::from_str::<Value>(&s).map_err(|e| {
            ParamsError::invalid("inline_policy", format!("not a JSON document: {e}"))
        })?),
        Some(doc @ Value::Object(_)) => Some(doc),
        Some(_) => {
            return Err(ParamsError::invalid(
                "inline_policy",
                "expected a JSON object or a JSON string",
            ));
        }
    };

    Ok(Invocation {
        control,
        scope_id,
        desired: PermissionSetSpec {
            name: args.name,
            description: non_empty(args.description),
            session_duration: Some(session_duration),
            relay_state: non_empty(args.relay_state),
            managed_policies,
            inline_policy,
            tags: args.tags.filter(|t| !t.is_empty()),
        },
    })
}

#[derive(Debug, Deserialize)]
struct AssignmentArgs {
    permission_set_arn: String,
    principal_type: PrincipalType,
    principal_id: String,
    target_id: String,
    #[serde(default)]
    target_type: TargetType,
}

/// Parse parameters of the account-assignment module.
pub fn parse_assignment(raw: &Value) -> Result<Invocation<AssignmentSpec>, ParamsError> {
    let (control, scope_id, tree) = split(raw, "instance_arn")?;
    check_pattern("instance_arn", &scope_id, &INSTANCE_ARN)?;

    let args: AssignmentArgs = serde_json::from_value(Value::Object(tree))?;
    check_pattern("permission_set_arn", &args.permission_set_arn, &PERMISSION_SET_ARN)?;
    check_pattern("target_id", &args.target_id, &ACCOUNT_ID)?;
    if args.principal_id.trim().is_empty() {
        return Err(ParamsError::missing("principal_id"));
    }

    Ok(Invocation {
        control,
        scope_id,
        desired: AssignmentSpec {
            target_id: args.target_id,
            target_type: args.target_type,
            permission_set_arn: args.permission_set_arn,
            principal_type: args.principal_type,
            principal_id: args.principal_id,
        },
    })
}

/// Parse parameters of the user listing.
pub fn parse_list_users(raw: &Value) -> Result<ListUsersArgs, ParamsError> {
    let mut args: ListUsersArgs = serde_json::from_value(raw.clone())?;
    check_pattern("instance_arn", &args.instance_arn, &INSTANCE_ARN)?;
    args.user_name = non_empty(args.user_name);
    Ok(args)
}

/// Split a raw parameter mapping into control fields, scope id and the
/// remaining attribute tree.
fn split(raw: &Value, scope_key: &str) -> Result<(ControlArgs, String, Map<String, Value>), ParamsError> {
    let Value::Object(map) = raw else {
        return Err(ParamsError::invalid("parameters", "expected a mapping"));
    };

    let control = ControlArgs::deserialize(raw)?;
    let scope_id = required_str(map, scope_key)?;

    let mut top = map.clone();
    top.remove("region");
    top.remove(scope_key);

    let Value::Object(tree) = convert::remove_keys(&Value::Object(top), CONTROL_KEYS) else {
        return Err(ParamsError::invalid("parameters", "expected a mapping"));
    };

    Ok((control, scope_id, tree))
}

fn expand_user_shorthands(tree: &mut Map<String, Value>) {
    let given = tree.remove("given_name");
    let family = tree.remove("family_name");

    let name = tree
        .entry("name")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(name) = name {
        if let Some(given) = given {
            name.entry("given_name").or_insert(given);
        }
        if let Some(family) = family {
            name.entry("family_name").or_insert(family);
        }
    }

    if let Some(email) = tree.remove("email") {
        let has_emails = tree.get("emails").is_some_and(|e| !convert::is_empty(e));
        if !has_emails && !convert::is_empty(&email) {
            tree.insert(
                "emails".to_string(),
                json!([{ "value": email, "type": "work", "primary": true }]),
            );
        }
    }

    let has_display_name = tree.get("display_name").is_some_and(|d| !convert::is_empty(d));
    if !has_display_name {
        let part = |key: &str| {
            tree.get("name")
                .and_then(|n| n.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let (Some(given), Some(family)) = (part("given_name"), part("family_name")) {
            tree.insert("display_name".to_string(), Value::String(format!("{given} {family}")));
        }
    }
}

fn required_str(map: &Map<String, Value>, field: &str) -> Result<String, ParamsError> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(ParamsError::missing(field)),
        Some(_) => Err(ParamsError::invalid(field, "expected a string")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn check_pattern(field: &str, value: &str, pattern: &Regex) -> Result<(), ParamsError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(ParamsError::invalid(field, format!("'{value}' is not well-formed")))
    }
}

/// At most one record per list may be flagged primary.
fn check_single_primary(
    field: &str,
    flags: impl Iterator<Item = Option<bool>>,
) -> Result<(), ParamsError> {
    let primaries = flags.filter(|p| *p == Some(true)).count();
    if primaries > 1 {
        return Err(ParamsError::invalid(
            field,
            format!("{primaries} entries are marked primary, at most one is allowed"),
        ));
    }
    Ok(())
}

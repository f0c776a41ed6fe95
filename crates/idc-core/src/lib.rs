use serde::{Deserialize, Serialize};

// Tool settings and wait/diff policies
pub mod config;

// Key normalizer (naming conventions, empty pruning, control-key removal)
pub mod convert;

pub mod error;

// Typed resource models
pub mod model;

// Invocation parameter parsing and validation
pub mod params;

pub use config::{DiffPolicy, Settings, WaitPolicy};
pub use error::{ClientError, ConfigError, ParamsError, ReconcileError};
pub use model::{
    AccountAssignment, Address, AssignmentSpec, AssignmentStatus, Email, Enterprise, Group,
    GroupSpec, Instance, Name, PermissionSet, PermissionSetAttributes, PermissionSetSpec,
    PhoneNumber, PrincipalType, TargetType, User, UserSpec,
};

/// Desired existence of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

/// One partial-update step: set `attribute_path` to `value`.
///
/// Paths are camelCase and dotted for nested fields (`name.givenName`).
/// Structured values are rendered with camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeOperation {
    pub attribute_path: String,
    pub value: serde_json::Value,
}

impl ChangeOperation {
    pub fn new(attribute_path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            attribute_path: attribute_path.into(),
            value,
        }
    }
}

/// Per-invocation context, passed by reference into every component.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    /// Identity store id (users, groups) or instance ARN (permission sets, assignments).
    pub scope_id: String,
    pub region: Option<String>,
    /// Report decisions without performing mutating calls.
    pub check_mode: bool,
    /// Post-create existence wait, if requested.
    pub wait: Option<WaitPolicy>,
    pub diff_policy: DiffPolicy,
}

impl ReconcileContext {
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            region: None,
            check_mode: false,
            wait: None,
            diff_policy: DiffPolicy::default(),
        }
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn with_wait(mut self, wait: Option<WaitPolicy>) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = policy;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// Terminal outcome of one reconciliation, handed to the result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub changed: bool,
    /// Server-assigned id, empty when there is none.
    pub resource_id: String,
    pub message: String,
    /// Freshly located snapshot after create/update, snake_case keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<serde_json::Value>,
    /// Remote request status for asynchronous operations (assignments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_status: Option<String>,
}

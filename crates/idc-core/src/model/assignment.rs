//! Account assignments: principal + permission set + target account.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrincipalType {
    User,
    Group,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "USER",
            PrincipalType::Group => "GROUP",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[default]
    AwsAccount,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::AwsAccount => "AWS_ACCOUNT",
        }
    }
}

/// Full identifying tuple of an assignment. Assignments carry no other state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssignmentSpec {
    pub target_id: String,
    #[serde(default)]
    pub target_type: TargetType,
    pub permission_set_arn: String,
    pub principal_type: PrincipalType,
    pub principal_id: String,
}

impl AssignmentSpec {
    /// Whether a listed assignment is this one.
    ///
    /// Listings are already scoped to instance, account and permission set, but
    /// the full tuple is compared so a mis-scoped page can never match.
    pub fn matches(&self, assignment: &AccountAssignment) -> bool {
        assignment.account_id == self.target_id
            && assignment.permission_set_arn == self.permission_set_arn
            && assignment.principal_type == self.principal_type
            && assignment.principal_id == self.principal_id
    }
}

impl fmt::Display for AssignmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {} ({})",
            self.principal_type, self.principal_id, self.target_id, self.permission_set_arn
        )
    }
}

/// An assignment as listed by the SSO admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountAssignment {
    pub account_id: String,
    pub permission_set_arn: String,
    pub principal_type: PrincipalType,
    pub principal_id: String,
}

impl From<&AssignmentSpec> for AccountAssignment {
    fn from(spec: &AssignmentSpec) -> Self {
        Self {
            account_id: spec.target_id.clone(),
            permission_set_arn: spec.permission_set_arn.clone(),
            principal_type: spec.principal_type,
            principal_id: spec.principal_id.clone(),
        }
    }
}

/// Status of an asynchronous assignment creation or deletion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssignmentStatus {
    /// `IN_PROGRESS`, `SUCCEEDED` or `FAILED`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

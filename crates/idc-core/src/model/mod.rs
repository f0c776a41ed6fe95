//! Typed resource models.
//!
//! Each resource kind has a desired-state `*Spec` (every optional attribute is
//! an `Option`, so "absent" is distinct from "empty") and a remote mirror that
//! also carries the server-assigned identifier.

pub mod assignment;
pub mod group;
pub mod permission_set;
pub mod user;

use serde::{Deserialize, Serialize};

pub use assignment::{AccountAssignment, AssignmentSpec, AssignmentStatus, PrincipalType, TargetType};
pub use group::{Group, GroupSpec};
pub use permission_set::{
    DEFAULT_SESSION_DURATION, PermissionSet, PermissionSetAttributes, PermissionSetSpec,
};
pub use user::{primary_flag, Address, Email, Enterprise, Name, PhoneNumber, User, UserSpec};

/// An Identity Center instance and the identity store behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub instance_arn: String,
    pub identity_store_id: String,
}

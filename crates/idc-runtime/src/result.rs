//! Result normalizer.

use idc_core::ReconciliationResult;
use serde_json::Value;

/// Terminal decision of the reconciler before it is shaped for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    AlreadyExists {
        id: String,
    },
    Created {
        id: String,
        resource: Option<Value>,
        status: Option<String>,
    },
    WouldCreate,
    Updated {
        id: String,
        resource: Option<Value>,
    },
    WouldUpdate {
        id: String,
    },
    Deleted {
        id: String,
        status: Option<String>,
    },
    WouldDelete {
        id: String,
    },
    DoesNotExist,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::AlreadyExists { .. } | Outcome::DoesNotExist)
    }

    fn verb(&self) -> &'static str {
        match self {
            Outcome::AlreadyExists { .. } => "already exists",
            Outcome::Created { .. } => "created successfully",
            Outcome::WouldCreate => "would be created (check mode)",
            Outcome::Updated { .. } => "updated successfully",
            Outcome::WouldUpdate { .. } => "would be updated (check mode)",
            Outcome::Deleted { .. } => "deleted successfully",
            Outcome::WouldDelete { .. } => "would be deleted (check mode)",
            Outcome::DoesNotExist => "does not exist",
        }
    }
}

/// Shape an outcome into the caller contract.
///
/// The message follows `"<Type> <key> <verb>"`.
pub fn normalize(label: &str, key: &str, outcome: Outcome) -> ReconciliationResult {
    let changed = outcome.changed();
    let message = format!("{label} {key} {}", outcome.verb());

    let (resource_id, resource, request_status) = match outcome {
        Outcome::Created { id, resource, status } => (id, resource, status),
        Outcome::Updated { id, resource } => (id, resource, None),
        Outcome::Deleted { id, status } => (id, None, status),
        Outcome::AlreadyExists { id } | Outcome::WouldUpdate { id } | Outcome::WouldDelete { id } => {
            (id, None, None)
        }
        Outcome::WouldCreate | Outcome::DoesNotExist => (String::new(), None, None),
    };

    ReconciliationResult {
        changed,
        resource_id,
        message,
        resource,
        request_status,
    }
}

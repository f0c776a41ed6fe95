//! Error types shared across the reconciler crates.

use thiserror::Error;

/// Error returned by a remote directory client.
///
/// `NotFound` is a structured condition the caller may decide to absorb;
/// everything else (auth, transport, throttling) is `Api`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The addressed resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the service or the transport.
    #[error("{0}")]
    Api(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Invocation parameters failed structural or choice constraints.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// A required field is missing or empty.
    #[error("missing required parameter: {field}")]
    Missing { field: String },

    /// A field is present but its value is not acceptable.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// The parameter tree does not match the expected shape.
    #[error("malformed parameters: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ParamsError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing { field: field.into() }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single reconciliation.
///
/// Every variant is terminal for the invocation; nothing here is retried.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Parameters rejected before any remote call was made.
    #[error(transparent)]
    Validation(#[from] ParamsError),

    /// The locator's underlying list/describe call failed.
    #[error("failed to look up {kind} {key}: {source}")]
    Fetch {
        kind: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    /// The create call failed.
    #[error("failed to create {kind} {key}: {source}")]
    Create {
        kind: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    /// The attribute-operation update call failed.
    #[error("failed to update {kind} {key}: {source}")]
    Update {
        kind: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    /// The delete call failed.
    #[error("failed to delete {kind} {key}: {source}")]
    Delete {
        kind: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    /// The resource was created but never became visible to the locator.
    #[error("{kind} {key} was created but is still not visible after {attempts} attempts")]
    WaitTimeout {
        kind: &'static str,
        key: String,
        attempts: u32,
    },
}

impl ReconcileError {
    /// Whether the failure originated from the remote service.
    pub fn is_remote(&self) -> bool {
        !matches!(
            self,
            ReconcileError::Validation(_) | ReconcileError::WaitTimeout { .. }
        )
    }
}

/// Failure loading the tool settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

//! Command implementations for the `idc` binary.

pub mod list_users;
pub mod params;
pub mod reconcile;

use idc_core::{ParamsError, ReconcileError};
use idc_runtime::QueryError;

/// Render a failure as the `msg` of the failure document.
pub fn failure_message(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<ReconcileError>() {
        return match err {
            ReconcileError::Validation(inner) => format!("Invalid parameters: {inner}"),
            ReconcileError::WaitTimeout { .. } => format!("Wait timed out: {err}"),
            _ => format!("AWS API error: {err}"),
        };
    }

    if let Some(err) = err.downcast_ref::<QueryError>() {
        return match err {
            QueryError::UnknownInstance(_) => err.to_string(),
            QueryError::Client(_) => format!("AWS API error: {err}"),
        };
    }

    if let Some(err) = err.downcast_ref::<ParamsError>() {
        return format!("Invalid parameters: {err}");
    }

    format!("{err:#}")
}

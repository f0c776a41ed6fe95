use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use idc_core::ClientError;
use std::error::Error;
use std::fmt::Debug;

// Both SDKs re-export the same smithy result type.
use aws_sdk_identitystore::error::SdkError;

const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Flatten an SDK error, keeping not-found distinguishable.
pub(crate) fn client_error<E, R>(operation: &str, err: SdkError<E, R>) -> ClientError
where
    E: ProvideErrorMetadata + Error + Send + Sync + 'static,
    R: Debug,
{
    let not_found = err
        .as_service_error()
        .and_then(|service| service.code())
        .is_some_and(|code| code == NOT_FOUND_CODE);
    let message = format!("{operation}: {}", DisplayErrorContext(&err));

    if not_found {
        ClientError::NotFound(message)
    } else {
        tracing::debug!(operation, error = %message, "AWS call failed");
        ClientError::Api(message)
    }
}

/// A request could not be built (missing required member).
pub(crate) fn build_error(operation: &str, err: impl std::fmt::Display) -> ClientError {
    ClientError::Api(format!("{operation}: invalid request: {err}"))
}

//! Post-create existence wait.

use idc_core::{ClientError, WaitPolicy};
use std::future::Future;

/// Why the wait ended without a resource.
#[derive(Debug)]
pub enum WaitError {
    /// Every attempt came back empty.
    Exhausted { attempts: u32 },
    /// A lookup failed outright.
    Lookup(ClientError),
}

/// Poll `probe` until it returns a resource.
///
/// The first check runs immediately; `delay` is slept between attempts, never
/// after the last one.
pub async fn until_visible<T, F, Fut>(policy: &WaitPolicy, mut probe: F) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ClientError>>,
{
    let attempts = policy.max_attempts();

    for attempt in 1..=attempts {
        if let Some(found) = probe().await.map_err(WaitError::Lookup)? {
            tracing::debug!(attempt, "resource visible");
            return Ok(found);
        }
        tracing::debug!(attempt, max_attempts = attempts, "resource not visible yet");

        if attempt < attempts {
            tokio::time::sleep(policy.delay()).await;
        }
    }

    tracing::warn!(attempts, "gave up waiting for resource");
    Err(WaitError::Exhausted { attempts })
}

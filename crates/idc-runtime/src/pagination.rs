//! Sequential page walking.
//!
//! Pages are fetched one at a time; the next page is only requested when the
//! current one did not satisfy the caller.

use crate::adapter::Page;
use idc_core::ClientError;
use std::future::Future;

/// Walk pages until `predicate` matches, returning the first match in
/// pagination order.
pub async fn find_first<T, F, Fut, P>(mut fetch: F, mut predicate: P) -> Result<Option<T>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ClientError>>,
    P: FnMut(&T) -> bool,
{
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;

        if let Some(found) = page.items.into_iter().find(|item| predicate(item)) {
            tracing::debug!(pages, "match found");
            return Ok(Some(found));
        }

        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => {
                tracing::debug!(pages, "listing exhausted without a match");
                return Ok(None);
            }
        }
    }
}

/// Walk every page and collect all items.
pub async fn collect_all<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ClientError>>,
{
    let mut items = Vec::new();
    let mut token = None;

    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.items);

        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(items),
        }
    }
}

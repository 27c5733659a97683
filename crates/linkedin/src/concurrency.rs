//! The one concession to concurrency in an otherwise single-threaded,
//! single-process pipeline (spec.md §5): a bounded worker pool of (default)
//! 5 concurrent LinkedIn post scrapes, fixed fan-out, no shared mutable
//! state (each task only returns its own post).
//!
//! The actual scrape is out of scope (spec.md §2 Non-goal 1); callers pass
//! in whatever async fetch closure wraps their scraper/MCP client.

use futures::stream::{self, StreamExt};

/// Runs `fetch_one` over every id in `ids`, at most `concurrency` in flight
/// at a time, and collects results in arbitrary completion order.
pub async fn fetch_bounded<Id, F, Fut, T, E>(ids: Vec<Id>, concurrency: usize, fetch_one: F) -> Vec<Result<T, E>>
where
    Id: Send + 'static,
    F: Fn(Id) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    stream::iter(ids.into_iter().map(fetch_one))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_all_tasks_and_collects_results() {
        let ids: Vec<u32> = (0..12).collect();
        let results = fetch_bounded(ids, 5, |id| async move {
            if id == 7 {
                Err::<u32, &'static str>("boom")
            } else {
                Ok(id * 2)
            }
        })
        .await;
        assert_eq!(results.len(), 12);
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok_count, 11);
    }
}

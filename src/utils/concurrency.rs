//! Bounded fan-out over independent items.

use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};

/// Concurrency used by jobs that query per-account data.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Run `f` over `items` with at most `limit` futures in flight.
/// Results come back in input order.
pub async fn map_bounded<I, F, Fut, T>(items: I, limit: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

/// Like [`map_bounded`], but stops at the first error.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub async fn try_map_bounded<I, F, Fut, T, E>(items: I, limit: usize, f: F) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

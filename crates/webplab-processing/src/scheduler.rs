//! Bounded-concurrency batch execution
//!
//! `run_batch` drives at most `concurrency` items at a time. Workers claim the next
//! unclaimed index from a shared cursor, so a slow item never holds back a free slot,
//! and every result is written back to the position of its input.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

/// The batch was cancelled before every item was claimed. Partial results are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Batch cancelled before completion")]
pub struct BatchCancelled;

/// Run `op` over every item with at most `concurrency` operations in flight.
///
/// Returns exactly one result per item, in input order. An empty input returns an
/// empty vector without invoking `op`. `concurrency` below 1 is treated as 1.
///
/// Cancellation is checked before each claim: items already running finish, no new
/// item starts, and the whole batch reports [`BatchCancelled`]. Dropping the returned
/// future stops claiming as well.
pub async fn run_batch<'a, T, R, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    cancel: &CancellationToken,
    op: F,
) -> Result<Vec<R>, BatchCancelled>
where
    F: Fn(usize, &'a T) -> Fut,
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let workers = concurrency.max(1).min(items.len());
    let cursor = AtomicUsize::new(0);

    tracing::debug!(items = items.len(), workers = workers, "Starting batch");

    let finished = join_all((0..workers).map(|_| drain(items, &cursor, cancel, &op))).await;

    if cancel.is_cancelled() {
        tracing::info!(items = items.len(), "Batch cancelled");
        return Err(BatchCancelled);
    }

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    for (index, result) in finished.into_iter().flatten() {
        slots[index] = Some(result);
    }

    // Every index below items.len() was claimed exactly once
    slots
        .into_iter()
        .collect::<Option<Vec<R>>>()
        .ok_or(BatchCancelled)
}

/// One worker: claim, run, repeat until the cursor passes the end or the batch is cancelled.
async fn drain<'a, T, R, F, Fut>(
    items: &'a [T],
    cursor: &AtomicUsize,
    cancel: &CancellationToken,
    op: &F,
) -> Vec<(usize, R)>
where
    F: Fn(usize, &'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut completed = Vec::new();
    while !cancel.is_cancelled() {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(item) = items.get(index) else {
            break;
        };
        completed.push((index, op(index, item).await));
    }
    completed
}

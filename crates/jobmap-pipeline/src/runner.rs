//! Bounded-concurrency batch execution.
//!
//! At most `concurrency` tasks are in flight at once. A slot frees as soon as
//! its task settles and the next unclaimed item starts immediately, so the
//! pool never waits for a whole wave to finish.

use std::fmt::Display;
use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `task` over every item with at most `concurrency` tasks in flight.
///
/// The output is positionally aligned with `items`. A task that returns
/// `Err` leaves `None` in its slot and does not disturb its siblings.
///
/// `on_progress(done, total)` is called once per settled item, success or
/// failure, with `done` strictly increasing up to `total`. Empty input
/// returns immediately without calling `task` or `on_progress`.
///
/// A `concurrency` of zero is treated as one.
pub async fn run_bounded<'a, T, R, E, F, Fut, P>(
    items: &'a [T],
    concurrency: usize,
    task: F,
    mut on_progress: P,
) -> Vec<Option<R>>
where
    F: Fn(&'a T, usize) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
    P: FnMut(usize, usize),
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut done = 0usize;

    let mut settled = stream::iter(items.iter().enumerate())
        .map(|(index, item)| {
            let fut = task(item, index);
            async move { (index, fut.await) }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, outcome)) = settled.next().await {
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(e) => {
                tracing::debug!(index, error = %e, "batch item failed; skipping");
            }
        }
        done += 1;
        on_progress(done, total);
    }

    slots
}

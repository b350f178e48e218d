//! The three stage executors. Each reads its upstream artifact through the
//! store, transforms every item, and persists its own artifact only after
//! the whole batch has joined. Dropping a stage future mid-flight leaves
//! the prior artifact untouched.

pub mod describe;
pub mod judge;
pub(crate) mod prompt;
pub mod pull;

pub use describe::DescribeStage;
pub use judge::JudgeStage;
pub use pull::PullStage;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Bounded per-item fan-out. Results come back in input order so stage
/// artifacts stay 1:1 with their upstream rows; per-item failure handling
/// belongs inside `make_task`.
pub(crate) async fn fan_out<I, O, F, Fut>(
    items: Vec<I>,
    parallel: usize,
    make_task: F,
) -> anyhow::Result<Vec<O>>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
{
    let total = items.len();
    let sem = Arc::new(Semaphore::new(parallel.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, item) in items.into_iter().enumerate() {
        let permit = sem.clone().acquire_owned().await?;
        let task = make_task(idx, item);
        join_set.spawn(async move {
            let _permit = permit;
            (idx, task.await)
        });
    }

    let mut out: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();
    while let Some(res) = join_set.join_next().await {
        let (idx, value) = res?;
        out[idx] = Some(value);
    }
    out.into_iter()
        .map(|slot| slot.ok_or_else(|| anyhow::anyhow!("fan-out slot never completed")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fan_out_preserves_input_order() {
        let items: Vec<usize> = (0..20).collect();
        let out = fan_out(items, 4, |_, i| async move {
            // Later items finish first.
            tokio::time::sleep(std::time::Duration::from_millis((20 - i) as u64)).await;
            i * 2
        })
        .await
        .unwrap();
        assert_eq!(out, (0..20).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn fan_out_respects_concurrency_bound() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..16).collect();
        let out = fan_out(items, 3, |_, i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await
        .unwrap();
        assert_eq!(out.len(), 16);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}

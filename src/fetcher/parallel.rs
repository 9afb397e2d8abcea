use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app::TributaryError;
use crate::domain::{BatchResult, FetchItem, FetchResult, ItemState};
use crate::fetcher::conditional::ConditionalFetcher;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Stand-in for deadlines too large to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Worker count used when none is configured: one per available CPU.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_WORKERS)
}

/// Exhaustible queue of item indices, drained by the workers.
struct IndexQueue {
    next: AtomicUsize,
    len: usize,
}

impl IndexQueue {
    fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    fn claim(&self) -> Option<usize> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        (index < self.len).then_some(index)
    }
}

/// Drives a [`ConditionalFetcher`] over a batch with a fixed pool of workers
/// and one deadline shared by the whole batch.
pub struct BatchRunner {
    fetcher: Arc<ConditionalFetcher>,
    workers: usize,
    deadline: Duration,
}

impl BatchRunner {
    /// A `workers` value of zero is clamped to one.
    pub fn with_workers(
        fetcher: Arc<ConditionalFetcher>,
        workers: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
            deadline,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn run(&self, items: &[FetchItem]) -> BatchResult {
        self.run_with_cancel(items, CancellationToken::new()).await
    }

    /// Fetch every item and return one result per item, in input order.
    ///
    /// Returns once all items have a result. When the deadline passes or
    /// `cancel` fires, in-flight fetches are dropped and unstarted items
    /// fail without touching the network.
    pub async fn run_with_cancel(
        &self,
        items: &[FetchItem],
        cancel: CancellationToken,
    ) -> BatchResult {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.deadline)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let items: Arc<[FetchItem]> = items.into();
        let queue = Arc::new(IndexQueue::new(items.len()));
        let workers = self.workers.min(items.len());

        tracing::debug!(
            "Fetching {} items with {} workers (deadline {:?})",
            items.len(),
            workers,
            self.deadline
        );

        // Each result is sent as soon as it exists. A panicking worker only
        // loses the item it was fetching.
        let (tx, mut rx) = mpsc::unbounded_channel::<FetchResult>();
        let mut handles = Vec::with_capacity(workers);

        for worker in 0..workers {
            let fetcher = self.fetcher.clone();
            let items = items.clone();
            let queue = queue.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();

            let handle = tokio::spawn(async move {
                while let Some(index) = queue.claim() {
                    let item = &items[index];
                    tracing::trace!(worker, index, state = %ItemState::InFlight, "{}", item.path);

                    let outcome = fetcher.fetch_until(item, deadline, &cancel).await;
                    let result = FetchResult::from_outcome(index, item, outcome);

                    tracing::debug!(worker, index, state = %result.state(), "{}", item.path);
                    if tx.send(result).is_err() {
                        break;
                    }
                }
            });

            handles.push(handle);
        }
        drop(tx);

        let mut slots: Vec<Option<FetchResult>> = std::iter::repeat_with(|| None)
            .take(items.len())
            .collect();

        while let Some(result) = rx.recv().await {
            let index = result.index;
            slots[index] = Some(result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Task join error: {}", e);
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    FetchResult::failed(
                        index,
                        &items[index],
                        TributaryError::WorkerAborted(format!(
                            "no result recorded for {}",
                            items[index].path
                        )),
                    )
                })
            })
            .collect();

        BatchResult::new(results)
    }
}

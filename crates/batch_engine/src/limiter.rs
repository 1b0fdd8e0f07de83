//! Concurrency limiter
//!
//! Jobs enter an unbounded FIFO queue; one admission loop takes them in
//! submission order, waits for one of `N` permits and spawns the job with the
//! permit attached. A job releases its permit before delivering its value, so
//! a resolved handle is no longer counted by [`ConcurrencyLimiter::in_flight`].
//! A panicking job frees its slot while its task unwinds.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use contracts::ContractError;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Queued job, started with the permit it must release
type Job = Box<dyn FnOnce(OwnedSemaphorePermit) -> JobFuture + Send>;

/// Job did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimiterError {
    /// The job panicked or was dropped before completing
    #[error("task aborted before completion")]
    Aborted,
}

/// Caps the number of concurrently executing jobs at `N`
///
/// Must be created inside a Tokio runtime.
pub struct ConcurrencyLimiter {
    max_concurrency: usize,
    semaphore: Arc<Semaphore>,
    queue: mpsc::UnboundedSender<Job>,
    queued: Arc<AtomicUsize>,
}

impl ConcurrencyLimiter {
    /// # Errors
    /// `ConfigValidation` when `max_concurrency` is zero.
    pub fn new(max_concurrency: usize) -> Result<Self, ContractError> {
        if max_concurrency == 0 {
            return Err(ContractError::config_validation(
                "job.concurrency",
                "concurrency must be >= 1",
            ));
        }

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let queued = Arc::new(AtomicUsize::new(0));
        let (queue, rx) = mpsc::unbounded_channel();

        tokio::spawn(admission_loop(rx, Arc::clone(&semaphore), Arc::clone(&queued)));
        debug!(max_concurrency, "Concurrency limiter started");

        Ok(Self {
            max_concurrency,
            semaphore,
            queue,
            queued,
        })
    }

    /// Enqueue `job`; never blocks
    pub fn submit<F, T>(&self, job: F) -> LimiterHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let wrapped: Job = Box::new(move |permit: OwnedSemaphorePermit| -> JobFuture {
            Box::pin(async move {
                let value = job.await;
                drop(permit);
                // Receiver gone means the caller stopped waiting.
                let _ = tx.send(value);
            })
        });

        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.queue.send(wrapped).is_err() {
            // Admission loop is gone; the dropped sender resolves the handle
            // to `Aborted`.
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }
        LimiterHandle { rx }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Jobs currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.semaphore.available_permits()
    }

    /// Jobs submitted but not yet admitted
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

async fn admission_loop(
    mut rx: mpsc::UnboundedReceiver<Job>,
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        queued.fetch_sub(1, Ordering::SeqCst);
        trace!(
            available = semaphore.available_permits(),
            "Job admitted"
        );
        tokio::spawn(job(permit));
    }
    debug!("Admission loop finished");
}

/// Completion of one submitted job
#[must_use = "a handle does nothing unless awaited"]
pub struct LimiterHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for LimiterHandle<T> {
    type Output = Result<T, LimiterError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| LimiterError::Aborted))
    }
}

//! Progress events - side channel from the orchestrator to renderers
//!
//! Observers only watch; they never take part in processing.

use std::time::Duration;

use crate::{BatchSummary, ItemStatus};

/// One per-item state transition
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub index: usize,
    pub label: String,
    pub kind: ProgressKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressKind {
    /// Submitted, waiting for a concurrency slot
    Pending,
    /// Admitted by the limiter
    Processing,
    /// Lookup and every sink append succeeded
    Completed { records: usize, elapsed: Duration },
    /// Lookup or a sink append failed
    Failed { error: String, elapsed: Duration },
}

impl ProgressKind {
    pub fn status(&self) -> ItemStatus {
        match self {
            Self::Pending => ItemStatus::Pending,
            Self::Processing => ItemStatus::Processing,
            Self::Completed { .. } => ItemStatus::Completed,
            Self::Failed { .. } => ItemStatus::Failed,
        }
    }
}

/// Subscriber to orchestrator progress
///
/// Called from worker tasks; implementations must not block.
pub trait ProgressObserver: Send + Sync {
    /// Batch accepted, before any item is submitted
    fn batch_started(&self, _total: usize, _concurrency: usize) {}

    /// Item transition
    fn on_event(&self, event: ProgressEvent);

    /// Every item reached a terminal state
    fn batch_finished(&self, _summary: &BatchSummary, _elapsed: Duration) {}
}

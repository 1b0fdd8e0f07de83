//! TaskOutcome / BatchResult - Batch engine output

use std::time::Duration;

use crate::{Record, WorkItem};

/// Terminal result for exactly one work item
#[derive(Debug, Clone)]
pub struct TaskOutcome<R> {
    /// The item this outcome belongs to
    pub item: WorkItem,

    /// Extracted records (empty on failure)
    pub records: Vec<R>,

    /// Failure description, `None` when the item completed
    pub failure: Option<String>,

    /// Rows appended across all sinks for this item
    pub records_written: usize,

    /// Wall time from admission to terminal state
    pub elapsed: Duration,
}

impl<R> TaskOutcome<R> {
    /// Completed outcome
    pub fn completed(item: WorkItem, records: Vec<R>, records_written: usize) -> Self {
        Self {
            item,
            records,
            failure: None,
            records_written,
            elapsed: Duration::ZERO,
        }
    }

    /// Failed outcome; records are always empty
    pub fn failed(item: WorkItem, failure: impl Into<String>) -> Self {
        Self {
            item,
            records: Vec::new(),
            failure: Some(failure.into()),
            records_written: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Attach the elapsed time
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn status(&self) -> ItemStatus {
        if self.is_success() {
            ItemStatus::Completed
        } else {
            ItemStatus::Failed
        }
    }
}

/// Conceptual per-item state machine
///
/// `Pending -> Processing -> {Completed, Failed}`; both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Aggregate totals of a batch, cheap to copy into observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_extracted: usize,
    pub records_written: usize,
}

/// Complete, order-preserved aggregation of all outcomes
#[derive(Debug, Clone)]
pub struct BatchResult<R> {
    outcomes: Vec<TaskOutcome<R>>,
    summary: BatchSummary,

    /// Wall time of the whole batch
    pub elapsed: Duration,
}

impl<R: Record> BatchResult<R> {
    /// Build from outcomes in any order; sorts by item index and computes
    /// totals in a single scan.
    pub fn from_outcomes(mut outcomes: Vec<TaskOutcome<R>>, elapsed: Duration) -> Self {
        outcomes.sort_by_key(|o| o.item.index);

        let mut summary = BatchSummary {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.records_extracted += outcome.records.len();
            summary.records_written += outcome.records_written;
        }

        Self {
            outcomes,
            summary,
            elapsed,
        }
    }

    /// Outcomes ordered by original item index
    pub fn outcomes(&self) -> &[TaskOutcome<R>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<TaskOutcome<R>> {
        self.outcomes
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.summary.succeeded
    }

    pub fn failed(&self) -> usize {
        self.summary.failed
    }

    pub fn records_written(&self) -> usize {
        self.summary.records_written
    }

    /// Iterate only failed outcomes
    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome<R>> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// All successfully extracted records in item order
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.outcomes.iter().flat_map(|o| o.records.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorContact, Parameters};

    fn author(link: &str) -> AuthorContact {
        AuthorContact {
            name: "A".into(),
            nationality: "French".into(),
            linkedin: String::new(),
            email: String::new(),
            paper_link: link.into(),
            notes: String::new(),
        }
    }

    fn item(index: usize) -> WorkItem {
        WorkItem::new(index, format!("paper-{index}"), Parameters::new())
    }

    #[test]
    fn test_from_outcomes_orders_by_index() {
        let outcomes = vec![
            TaskOutcome::completed(item(2), vec![author("p2")], 1),
            TaskOutcome::failed(item(0), "boom"),
            TaskOutcome::completed(item(1), vec![author("p1"), author("p1")], 3),
        ];
        let result = BatchResult::from_outcomes(outcomes, Duration::from_secs(1));

        let indices: Vec<_> = result.outcomes().iter().map(|o| o.item.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        let summary = result.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records_extracted, 3);
        assert_eq!(summary.records_written, 4);
    }

    #[test]
    fn test_failed_outcome_has_no_records() {
        let outcome: TaskOutcome<AuthorContact> = TaskOutcome::failed(item(0), "timeout");
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.status(), ItemStatus::Failed);
        assert!(outcome.status().is_terminal());
        assert!(!ItemStatus::Processing.is_terminal());
    }
}

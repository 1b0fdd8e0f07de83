//! Batch orchestrator
//!
//! Submits every item through the [`ConcurrencyLimiter`], waits for all of
//! them and aggregates the outcomes in input order. Input validation is the
//! only fallible step; once submission begins the batch always produces a
//! [`BatchResult`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    BatchResult, Classifier, ContractError, Lookup, ProgressEvent, ProgressKind, ProgressObserver,
    TaskOutcome, WorkItem,
};
use dispatcher::SinkWriter;
use tracing::{error, info, instrument};

use crate::limiter::ConcurrencyLimiter;
use crate::progress::NoopObserver;
use crate::runner::{RunMode, TaskRunner};

/// Builder for [`BatchOrchestrator`]
pub struct BatchOrchestratorBuilder<L: Lookup, C> {
    lookup: L,
    classifier: C,
    writer: Arc<SinkWriter<L::Record>>,
    concurrency: usize,
    mode: RunMode,
    observer: Arc<dyn ProgressObserver>,
}

impl<L, C> BatchOrchestratorBuilder<L, C>
where
    L: Lookup + Send + Sync + 'static,
    C: Classifier<L::Record> + 'static,
{
    /// Maximum items in flight
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Synthetic lookups, no sink writes
    pub fn dry_run(mut self, delay: Duration) -> Self {
        self.mode = RunMode::DryRun { delay };
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// `ConfigValidation` when concurrency is zero.
    pub fn build(self) -> Result<BatchOrchestrator<L, C>, ContractError> {
        let limiter = ConcurrencyLimiter::new(self.concurrency)?;
        let runner = TaskRunner::new(
            self.lookup,
            self.classifier,
            self.writer,
            Arc::clone(&self.observer),
            self.mode,
        );
        Ok(BatchOrchestrator {
            runner: Arc::new(runner),
            limiter,
            observer: self.observer,
        })
    }
}

/// Runs a whole batch with bounded concurrency
pub struct BatchOrchestrator<L: Lookup, C> {
    runner: Arc<TaskRunner<L, C>>,
    limiter: ConcurrencyLimiter,
    observer: Arc<dyn ProgressObserver>,
}

impl<L, C> BatchOrchestrator<L, C>
where
    L: Lookup + Send + Sync + 'static,
    C: Classifier<L::Record> + 'static,
{
    pub fn builder(
        lookup: L,
        classifier: C,
        writer: Arc<SinkWriter<L::Record>>,
    ) -> BatchOrchestratorBuilder<L, C> {
        BatchOrchestratorBuilder {
            lookup,
            classifier,
            writer,
            concurrency: 3,
            mode: RunMode::Live,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub fn runner(&self) -> &TaskRunner<L, C> {
        &self.runner
    }

    /// Process every item and aggregate the outcomes by `item.index`
    ///
    /// # Errors
    /// `Input` when `items` is empty or two items share an index; nothing is
    /// submitted in that case.
    #[instrument(
        name = "batch_run",
        skip(self, items),
        fields(items = items.len(), concurrency = self.limiter.max_concurrency())
    )]
    pub async fn run(&self, items: Vec<WorkItem>) -> Result<BatchResult<L::Record>, ContractError> {
        validate_items(&items)?;

        let started = Instant::now();
        let total = items.len();
        self.observer.batch_started(total, self.limiter.max_concurrency());
        for item in &items {
            self.observer.on_event(ProgressEvent {
                index: item.index,
                label: item.label().to_string(),
                kind: ProgressKind::Pending,
            });
        }
        info!(total, mode = ?self.runner.mode(), "Batch started");

        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let runner = Arc::clone(&self.runner);
                let fallback = item.clone();
                let handle = self.limiter.submit(async move { runner.run(item).await });
                (fallback, handle)
            })
            .collect();

        let mut slots: Vec<Option<TaskOutcome<L::Record>>> = (0..total).map(|_| None).collect();
        for (position, (item, handle)) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(item = item.index, error = %e, "Task aborted");
                    self.observer.on_event(ProgressEvent {
                        index: item.index,
                        label: item.label().to_string(),
                        kind: ProgressKind::Failed {
                            error: e.to_string(),
                            elapsed: started.elapsed(),
                        },
                    });
                    TaskOutcome::failed(item, e.to_string())
                }
            };
            slots[position] = Some(outcome);
        }

        let outcomes = slots.into_iter().flatten().collect();
        let result = BatchResult::from_outcomes(outcomes, started.elapsed());
        let summary = result.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            records = summary.records_extracted,
            written = summary.records_written,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Batch finished"
        );
        self.observer.batch_finished(&summary, result.elapsed);
        Ok(result)
    }
}

fn validate_items(items: &[WorkItem]) -> Result<(), ContractError> {
    if items.is_empty() {
        return Err(ContractError::input("batch", "no work items to process"));
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.index) {
            return Err(ContractError::input(
                "batch",
                format!("duplicate item index {}", item.index),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ChannelObserver, ProgressUpdate};
    use contracts::{AuthorContact, ItemStatus, Parameters, SinkTarget};
    use dispatcher::{MemoryBuffer, SinkBackend};
    use lookup::ScriptedLookup;

    fn authors(item: &WorkItem) -> Vec<AuthorContact> {
        vec![AuthorContact {
            name: format!("Author of {}", item.identifier),
            nationality: "Germany".into(),
            linkedin: String::new(),
            email: String::new(),
            paper_link: item.identifier.clone(),
            notes: String::new(),
        }]
    }

    fn items(n: usize) -> Vec<WorkItem> {
        (0..n)
            .map(|i| WorkItem::new(i, format!("item-{i}"), Parameters::new()))
            .collect()
    }

    fn memory_writer(buffer: &MemoryBuffer) -> Arc<SinkWriter<AuthorContact>> {
        Arc::new(
            SinkWriter::builder()
                .register("all", SinkBackend::Memory(buffer.clone()))
                .build()
                .unwrap(),
        )
    }

    fn to_all(_: &AuthorContact) -> Vec<SinkTarget> {
        vec![SinkTarget::new("all")]
    }

    #[tokio::test]
    async fn test_empty_and_duplicate_items_rejected() {
        let buffer = MemoryBuffer::new();
        let orchestrator =
            BatchOrchestrator::builder(ScriptedLookup::new(authors), to_all, memory_writer(&buffer))
                .build()
                .unwrap();

        let err = orchestrator.run(Vec::new()).await.unwrap_err();
        assert!(matches!(err, ContractError::Input { .. }));

        let mut dup = items(2);
        dup[1].index = 0;
        let err = orchestrator.run(dup).await.unwrap_err();
        assert!(err.to_string().contains("duplicate item index 0"));
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected_at_build() {
        let buffer = MemoryBuffer::new();
        let result =
            BatchOrchestrator::builder(ScriptedLookup::new(authors), to_all, memory_writer(&buffer))
                .concurrency(0)
                .build();
        assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_outcomes_follow_input_order_under_latency() {
        let buffer = MemoryBuffer::new();
        // Later items finish first
        let lookup = (0..6).fold(ScriptedLookup::new(authors), |lookup, i| {
            lookup.delay(format!("item-{i}"), Duration::from_millis(30 - i as u64 * 5))
        });
        let orchestrator = BatchOrchestrator::builder(lookup, to_all, memory_writer(&buffer))
            .concurrency(6)
            .build()
            .unwrap();

        let result = orchestrator.run(items(6)).await.unwrap();

        let order: Vec<_> = result.outcomes().iter().map(|o| o.item.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.summary().succeeded, 6);
        assert_eq!(buffer.lines().len(), 7);
    }

    #[tokio::test]
    async fn test_progress_sequence() {
        let buffer = MemoryBuffer::new();
        let (observer, mut rx) = ChannelObserver::new();
        let orchestrator = BatchOrchestrator::builder(
            ScriptedLookup::new(authors).fail("item-1", "boom"),
            to_all,
            memory_writer(&buffer),
        )
        .concurrency(1)
        .observer(Arc::new(observer))
        .build()
        .unwrap();

        orchestrator.run(items(2)).await.unwrap();

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        assert_eq!(
            updates.first(),
            Some(&ProgressUpdate::Started {
                total: 2,
                concurrency: 1
            })
        );
        let statuses: Vec<_> = updates
            .iter()
            .filter_map(|u| match u {
                ProgressUpdate::Item(e) => Some((e.index, e.kind.status())),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                (0, ItemStatus::Pending),
                (1, ItemStatus::Pending),
                (0, ItemStatus::Processing),
                (0, ItemStatus::Completed),
                (1, ItemStatus::Processing),
                (1, ItemStatus::Failed),
            ]
        );
        let Some(ProgressUpdate::Finished { summary, .. }) = updates.last() else {
            panic!("expected finished update");
        };
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
    }
}

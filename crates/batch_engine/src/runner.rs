//! Task runner - one work item from lookup to sink appends
//!
//! Never returns an error: every lookup or sink failure ends up on the item's
//! [`TaskOutcome`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    Classifier, Lookup, ProgressEvent, ProgressKind, ProgressObserver, SinkTarget,
    TaskOutcome, WorkItem,
};
use dispatcher::SinkWriter;
use observability::metrics::{
    record_in_flight, record_item_finished, record_lookup_ms, record_records_written,
    record_sink_append_ms,
};
use tracing::{debug, instrument, warn};

/// Records for one target, in lookup order
pub type TargetBatch<R> = (SinkTarget, Vec<R>);

/// Lookup mode of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Real lookup, records appended to sinks
    #[default]
    Live,
    /// Synthetic lookup after `delay`, nothing written
    DryRun { delay: Duration },
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun { .. })
    }
}

/// Executes single items; shared by every task of a batch
pub struct TaskRunner<L: Lookup, C> {
    lookup: L,
    classifier: C,
    writer: Arc<SinkWriter<L::Record>>,
    observer: Arc<dyn ProgressObserver>,
    mode: RunMode,
    active: AtomicUsize,
}

impl<L, C> TaskRunner<L, C>
where
    L: Lookup,
    C: Classifier<L::Record>,
{
    pub fn new(
        lookup: L,
        classifier: C,
        writer: Arc<SinkWriter<L::Record>>,
        observer: Arc<dyn ProgressObserver>,
        mode: RunMode,
    ) -> Self {
        Self {
            lookup,
            classifier,
            writer,
            observer,
            mode,
            active: AtomicUsize::new(0),
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn writer(&self) -> &Arc<SinkWriter<L::Record>> {
        &self.writer
    }

    /// Items currently between `Processing` and their terminal event
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Process one item to its terminal outcome
    #[instrument(
        name = "task_runner",
        skip(self, item),
        fields(item = item.index, id = %item.identifier)
    )]
    pub async fn run(&self, item: WorkItem) -> TaskOutcome<L::Record> {
        let started = Instant::now();
        let active = ActiveGuard::enter(&self.active);
        self.emit(&item, ProgressKind::Processing);

        let outcome = self.process(item).await.with_elapsed(started.elapsed());

        drop(active);
        record_item_finished(outcome.status(), outcome.elapsed);

        let kind = match &outcome.failure {
            None => ProgressKind::Completed {
                records: outcome.records.len(),
                elapsed: outcome.elapsed,
            },
            Some(error) => ProgressKind::Failed {
                error: error.clone(),
                elapsed: outcome.elapsed,
            },
        };
        self.emit(&outcome.item, kind);
        outcome
    }

    async fn process(&self, item: WorkItem) -> TaskOutcome<L::Record> {
        if let RunMode::DryRun { delay } = self.mode {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let records = self.lookup.synthetic(&item);
            debug!(records = records.len(), "Dry run, nothing written");
            return TaskOutcome::completed(item, records, 0);
        }

        let lookup_started = Instant::now();
        let records = match self.lookup.lookup(&item).await {
            Ok(records) => {
                record_lookup_ms(self.lookup.name(), lookup_started.elapsed(), true);
                records
            }
            Err(e) => {
                record_lookup_ms(self.lookup.name(), lookup_started.elapsed(), false);
                warn!(error = %e, "Lookup failed");
                return TaskOutcome::failed(item, e.to_string());
            }
        };

        match self.write(&records).await {
            Ok(written) => {
                debug!(records = records.len(), written, "Item completed");
                TaskOutcome::completed(item, records, written)
            }
            Err(failures) => TaskOutcome::failed(item, failures.join("; ")),
        }
    }

    /// Append every target batch; all targets are attempted
    async fn write(&self, records: &[L::Record]) -> Result<usize, Vec<String>> {
        let mut written = 0;
        let mut failures = Vec::new();

        for (target, batch) in self.group(records) {
            let started = Instant::now();
            match self.writer.append(target.as_str(), &batch).await {
                Ok(rows) => {
                    record_sink_append_ms(target.as_str(), started.elapsed(), true);
                    record_records_written(target.as_str(), rows);
                    written += rows;
                }
                Err(e) => {
                    record_sink_append_ms(target.as_str(), started.elapsed(), false);
                    warn!(sink = %target, error = %e, "Sink append failed");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(failures)
        }
    }

    /// Group records by target, keeping record order inside each group and
    /// ordering groups by sink registration. Unregistered targets go last and
    /// fail at append time.
    pub fn group(&self, records: &[L::Record]) -> Vec<TargetBatch<L::Record>> {
        let mut groups: Vec<TargetBatch<L::Record>> = Vec::new();

        for record in records {
            let mut targets = self.classifier.classify(record);
            targets.sort_unstable();
            targets.dedup();

            for target in targets {
                match groups.iter_mut().find(|(t, _)| *t == target) {
                    Some((_, batch)) => batch.push(record.clone()),
                    None => groups.push((target, vec![record.clone()])),
                }
            }
        }

        groups.sort_by_key(|(target, _)| {
            self.writer
                .position(target.as_str())
                .unwrap_or(usize::MAX)
        });
        groups
    }

    fn emit(&self, item: &WorkItem, kind: ProgressKind) {
        self.observer.on_event(ProgressEvent {
            index: item.index,
            label: item.label().to_string(),
            kind,
        });
    }
}

/// Counts one running item; the gauge drops back even if the item panics
struct ActiveGuard<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ActiveGuard<'a> {
    fn enter(active: &'a AtomicUsize) -> Self {
        record_in_flight(active.fetch_add(1, Ordering::SeqCst) + 1);
        Self { active }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        record_in_flight(self.active.fetch_sub(1, Ordering::SeqCst) - 1);
    }
}

impl<L: Lookup, C> std::fmt::Debug for TaskRunner<L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("lookup", &self.lookup.name())
            .field("mode", &self.mode)
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish()
    }
}

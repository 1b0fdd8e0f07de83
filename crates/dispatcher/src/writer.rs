//! SinkWriter - serialized appends to named targets
//!
//! Every target gets its own lock and header flag at registration time.
//! Appends to one target never interleave; appends to different targets
//! never wait on each other.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use contracts::{ContractError, DataSink, Record, SinkConfig, SinkTarget, SinkType};

use crate::encode::encode_rows;
use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{AnySink, FileSink, LogSink, MemoryBuffer, MemorySink};

/// Backing storage of one target
#[derive(Debug, Clone)]
pub enum SinkBackend {
    /// Append to a file, created with its parent directories when missing
    File { path: PathBuf },
    /// Append into a shared in-process buffer
    Memory(MemoryBuffer),
    /// Log rows only
    Log,
}

impl SinkBackend {
    fn open(&self, name: &str) -> AnySink {
        match self {
            Self::File { path } => AnySink::File(FileSink::new(name, path.clone())),
            Self::Memory(buffer) => AnySink::Memory(MemorySink::new(name, buffer.clone())),
            Self::Log => AnySink::Log(LogSink::new(name)),
        }
    }
}

/// One target and where it writes
#[derive(Debug, Clone)]
pub struct SinkRegistration {
    pub target: SinkTarget,
    pub backend: SinkBackend,
}

impl SinkRegistration {
    pub fn new(target: impl Into<SinkTarget>, backend: SinkBackend) -> Self {
        Self {
            target: target.into(),
            backend,
        }
    }

    /// Translate a sink config; file sinks must carry a path
    pub fn from_config(config: &SinkConfig) -> Result<Self, DispatcherError> {
        let backend = match config.sink_type {
            SinkType::File => {
                let path = config.path.clone().ok_or_else(|| {
                    DispatcherError::sink_creation(&config.name, "file sink requires a path")
                })?;
                SinkBackend::File { path }
            }
            SinkType::Memory => SinkBackend::Memory(MemoryBuffer::new()),
            SinkType::Log => SinkBackend::Log,
        };
        Ok(Self::new(config.name.as_str(), backend))
    }
}

struct SinkState {
    sink: AnySink,
    header_written: bool,
}

struct SinkSlot {
    target: SinkTarget,
    backend: SinkBackend,
    state: Mutex<SinkState>,
    metrics: Arc<SinkMetrics>,
}

/// Outcome of one successful append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    pub rows: usize,
    pub header_written: bool,
    pub elapsed: Duration,
}

/// Builder for creating a SinkWriter
pub struct SinkWriterBuilder<R> {
    registrations: Vec<SinkRegistration>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SinkWriterBuilder<R> {
    /// Register one target
    pub fn register(mut self, target: impl Into<SinkTarget>, backend: SinkBackend) -> Self {
        self.registrations
            .push(SinkRegistration::new(target, backend));
        self
    }

    pub fn registration(mut self, registration: SinkRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Build the fixed target map
    ///
    /// # Errors
    /// Duplicate target names and duplicate file paths are rejected.
    #[instrument(
        name = "sink_writer_build",
        skip(self),
        fields(sink_count = self.registrations.len())
    )]
    pub fn build(self) -> Result<SinkWriter<R>, DispatcherError> {
        let mut index = HashMap::with_capacity(self.registrations.len());
        let mut paths: HashMap<PathBuf, SinkTarget> = HashMap::new();
        let mut slots = Vec::with_capacity(self.registrations.len());

        for registration in self.registrations {
            let SinkRegistration { target, backend } = registration;

            if index.contains_key(&target) {
                return Err(DispatcherError::DuplicateTarget(target.to_string()));
            }
            if let SinkBackend::File { path } = &backend {
                if let Some(first) = paths.get(path) {
                    return Err(DispatcherError::DuplicatePath {
                        first: first.to_string(),
                        second: target.to_string(),
                        path: path.clone(),
                    });
                }
                paths.insert(path.clone(), target.clone());
            }

            debug!(sink = %target, backend = ?backend, "Sink registered");
            index.insert(target.clone(), slots.len());
            slots.push(SinkSlot {
                state: Mutex::new(SinkState {
                    sink: backend.open(target.as_str()),
                    header_written: false,
                }),
                target,
                backend,
                metrics: Arc::new(SinkMetrics::new()),
            });
        }

        Ok(SinkWriter {
            index,
            slots,
            _record: PhantomData,
        })
    }
}

/// Multi-target append writer, shared by every task of a run
pub struct SinkWriter<R> {
    index: HashMap<SinkTarget, usize>,
    slots: Vec<SinkSlot>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SinkWriter<R> {
    pub fn builder() -> SinkWriterBuilder<R> {
        SinkWriterBuilder {
            registrations: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Build a writer from sink configs, in config order
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, DispatcherError> {
        configs
            .iter()
            .try_fold(Self::builder(), |builder, config| {
                SinkRegistration::from_config(config).map(|r| builder.registration(r))
            })?
            .build()
    }

    /// Registered targets in registration order
    pub fn targets(&self) -> impl Iterator<Item = &SinkTarget> {
        self.slots.iter().map(|slot| &slot.target)
    }

    /// Registration position of `target`
    pub fn position(&self, target: &str) -> Option<usize> {
        self.index.get(target).copied()
    }

    pub fn backend(&self, target: &str) -> Option<&SinkBackend> {
        self.slot(target).map(|slot| &slot.backend)
    }

    pub fn metrics(&self, target: &str) -> Option<MetricsSnapshot> {
        self.slot(target).map(|slot| slot.metrics.snapshot())
    }

    /// Metrics for all targets in registration order
    pub fn all_metrics(&self) -> Vec<(SinkTarget, MetricsSnapshot)> {
        self.slots
            .iter()
            .map(|slot| (slot.target.clone(), slot.metrics.snapshot()))
            .collect()
    }

    fn slot(&self, target: &str) -> Option<&SinkSlot> {
        self.position(target).map(|i| &self.slots[i])
    }

    /// Append `records` to `target` as one contiguous write.
    ///
    /// The first successful append of the run emits the header when the
    /// backing storage is missing or empty. A failed write leaves the header
    /// flag untouched so the next append decides again.
    ///
    /// # Errors
    /// `UnknownSink` for an unregistered target, `SinkWrite` when encoding or
    /// the write itself fails.
    pub async fn append(&self, target: &str, records: &[R]) -> Result<usize, ContractError> {
        self.append_with_report(target, records)
            .await
            .map(|report| report.rows)
    }

    #[instrument(
        name = "sink_writer_append",
        skip(self, records),
        fields(sink = %target, rows = records.len())
    )]
    pub async fn append_with_report(
        &self,
        target: &str,
        records: &[R],
    ) -> Result<AppendReport, ContractError> {
        let slot = self
            .slot(target)
            .ok_or_else(|| ContractError::unknown_sink(target))?;

        if records.is_empty() {
            return Ok(AppendReport {
                rows: 0,
                header_written: false,
                elapsed: Duration::ZERO,
            });
        }

        let started = Instant::now();
        let mut state = slot.state.lock().await;

        let result = Self::write_locked(&mut state, target, records).await;
        drop(state);

        match result {
            Ok((header_written, bytes)) => {
                slot.metrics.record_append(records.len(), bytes);
                Ok(AppendReport {
                    rows: records.len(),
                    header_written,
                    elapsed: started.elapsed(),
                })
            }
            Err(e) => {
                slot.metrics.inc_failure_count();
                warn!(sink = %target, error = %e, "Append failed");
                Err(e)
            }
        }
    }

    async fn write_locked(
        state: &mut SinkState,
        target: &str,
        records: &[R],
    ) -> Result<(bool, usize), ContractError> {
        let include_header = !state.header_written && state.sink.needs_header().await?;
        let chunk = encode_rows(target, include_header, records)?;

        state.sink.append(&chunk).await?;
        state.header_written = true;

        if include_header {
            debug!(sink = %target, "Header written");
        }
        Ok((include_header, chunk.len()))
    }

    /// Flush every backend
    pub async fn flush_all(&self) -> Result<(), ContractError> {
        for slot in &self.slots {
            slot.state.lock().await.sink.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AuthorContact;
    use tempfile::tempdir;

    fn author(name: &str, nationality: &str) -> AuthorContact {
        AuthorContact {
            name: name.into(),
            nationality: nationality.into(),
            linkedin: "Not found".into(),
            email: "Not found".into(),
            paper_link: "https://example.org/p".into(),
            notes: String::new(),
        }
    }

    const HEADER: &str = "Name,Nationality,LinkedIn,Email,Link to Paper,Notes";

    #[tokio::test]
    async fn test_header_written_once() {
        let buffer = MemoryBuffer::new();
        let writer = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::Memory(buffer.clone()))
            .build()
            .unwrap();

        assert_eq!(writer.append("all", &[author("A", "French")]).await.unwrap(), 1);
        assert_eq!(
            writer
                .append("all", &[author("B", "Dutch"), author("C", "Irish")])
                .await
                .unwrap(),
            2
        );

        let lines = buffer.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.iter().filter(|l| *l == HEADER).count(), 1);
    }

    #[tokio::test]
    async fn test_existing_file_gets_no_second_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("all.csv");
        std::fs::write(&path, format!("{HEADER}\nOld,British,,,,\n")).unwrap();

        let writer = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::File { path: path.clone() })
            .build()
            .unwrap();
        writer.append("all", &[author("New", "Greek")]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(HEADER).count(), 1);
        assert!(text.ends_with("New,Greek,Not found,Not found,https://example.org/p,\n"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.csv");
        let writer = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::File { path: path.clone() })
            .build()
            .unwrap();

        assert_eq!(writer.append("all", &[]).await.unwrap(), 0);
        assert!(!path.exists());
        assert_eq!(writer.metrics("all").unwrap().append_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let writer = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::Log)
            .build()
            .unwrap();

        let err = writer.append("missing", &[author("A", "x")]).await.unwrap_err();
        assert!(matches!(err, ContractError::UnknownSink { ref sink_name } if sink_name == "missing"));
    }

    #[test]
    fn test_duplicate_registrations_rejected() {
        let dup_name = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::Log)
            .register("all", SinkBackend::Log)
            .build();
        assert!(matches!(dup_name, Err(DispatcherError::DuplicateTarget(_))));

        let dup_path = SinkWriter::<AuthorContact>::builder()
            .register("a", SinkBackend::File { path: "out.csv".into() })
            .register("b", SinkBackend::File { path: "out.csv".into() })
            .build();
        assert!(matches!(dup_path, Err(DispatcherError::DuplicatePath { .. })));
    }

    #[tokio::test]
    async fn test_failed_write_releases_lock_and_retries_header() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        // A regular file where the parent directory should be
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("out.csv");

        let writer = SinkWriter::<AuthorContact>::builder()
            .register("all", SinkBackend::File { path: path.clone() })
            .build()
            .unwrap();

        let err = writer.append("all", &[author("A", "x")]).await.unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
        assert_eq!(writer.metrics("all").unwrap().failure_count, 1);

        std::fs::remove_file(&blocker).unwrap();

        // Lock was released and the header decision is made again
        let report = writer
            .append_with_report("all", &[author("B", "y")])
            .await
            .unwrap();
        assert!(report.header_written);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{HEADER}\nB,y,Not found,Not found,https://example.org/p,\n"));
    }

    #[tokio::test]
    async fn test_from_configs_keeps_order() {
        let dir = tempdir().unwrap();
        let configs = vec![
            SinkConfig::file("all", dir.path().join("a.csv"), Default::default()),
            SinkConfig {
                name: "debug".into(),
                sink_type: SinkType::Log,
                path: None,
                route: Default::default(),
            },
        ];
        let writer = SinkWriter::<AuthorContact>::from_configs(&configs).unwrap();
        let names: Vec<_> = writer.targets().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["all", "debug"]);
        assert_eq!(writer.position("debug"), Some(1));
    }

    #[test]
    fn test_file_config_without_path_rejected() {
        let config = SinkConfig {
            name: "broken".into(),
            sink_type: SinkType::File,
            path: None,
            route: Default::default(),
        };
        assert!(matches!(
            SinkRegistration::from_config(&config),
            Err(DispatcherError::SinkCreation { .. })
        ));
    }
}

//! LogSink - logs appended rows via tracing

use contracts::{ContractError, DataSink};
use tracing::{debug, info, instrument};

/// Sink that logs row summaries for debugging; nothing is persisted
pub struct LogSink {
    name: String,
    rows_seen: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows_seen: 0,
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn needs_header(&mut self) -> Result<bool, ContractError> {
        Ok(self.rows_seen == 0)
    }

    #[instrument(
        name = "log_sink_append",
        skip(self, chunk),
        fields(sink = %self.name)
    )]
    async fn append(&mut self, chunk: &[u8]) -> Result<(), ContractError> {
        let text = String::from_utf8_lossy(chunk);
        for line in text.lines() {
            self.rows_seen += 1;
            debug!(sink = %self.name, line = self.rows_seen, row = %line, "Row");
        }
        info!(sink = %self.name, bytes = chunk.len(), total_lines = self.rows_seen, "Rows appended");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

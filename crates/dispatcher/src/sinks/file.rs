//! FileSink - appends encoded rows to one CSV file on disk

use contracts::{ContractError, DataSink};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// Sink that appends to a single file, creating it (and its parent
/// directories) on the first write.
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Create a new FileSink; nothing is touched on disk until the first append
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&mut self) -> std::io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            debug!(sink = %self.name, path = %self.path.display(), "File opened for append");
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(std::io::Error::other("file handle unavailable")),
        }
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let file = self.open().await?;
        file.write_all(chunk).await?;
        file.flush().await
    }

    fn write_error(&self, e: std::io::Error) -> ContractError {
        error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
        ContractError::sink_write(&self.name, format!("{}: {e}", self.path.display()))
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn needs_header(&mut self) -> Result<bool, ContractError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(self.write_error(e)),
        }
    }

    #[instrument(
        name = "file_sink_append",
        skip(self, chunk),
        fields(sink = %self.name, bytes = chunk.len())
    )]
    async fn append(&mut self, chunk: &[u8]) -> Result<(), ContractError> {
        if let Err(e) = self.write_chunk(chunk).await {
            // Reopen on the next attempt
            self.file = None;
            return Err(self.write_error(e));
        }
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush().await {
                return Err(self.write_error(e));
            }
        }
        Ok(())
    }
}

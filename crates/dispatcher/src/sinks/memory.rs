//! MemorySink - in-process buffer, used for tests and inspection

use bytes::BytesMut;
use contracts::{ContractError, DataSink};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the bytes a MemorySink has received
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    inner: Arc<Mutex<BytesMut>>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that already holds `contents`, as if written by an earlier run
    pub fn with_contents(contents: &str) -> Self {
        let buffer = Self::new();
        buffer.lock().extend_from_slice(contents.as_bytes());
        buffer
    }

    fn lock(&self) -> MutexGuard<'_, BytesMut> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Buffer contents as text (lossy)
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Contents split into lines, terminators removed
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

/// Sink that appends into a [`MemoryBuffer`]
pub struct MemorySink {
    name: String,
    buffer: MemoryBuffer,
}

impl MemorySink {
    pub fn new(name: impl Into<String>, buffer: MemoryBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }

    pub fn buffer(&self) -> &MemoryBuffer {
        &self.buffer
    }
}

impl DataSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn needs_header(&mut self) -> Result<bool, ContractError> {
        Ok(self.buffer.is_empty())
    }

    async fn append(&mut self, chunk: &[u8]) -> Result<(), ContractError> {
        self.buffer.lock().extend_from_slice(chunk);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

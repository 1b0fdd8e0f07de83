//! Sink implementations
//!
//! Contains FileSink, MemorySink and LogSink, plus the closed set the writer
//! dispatches over.

mod file;
mod log;
mod memory;

use contracts::{ContractError, DataSink};

pub use self::file::FileSink;
pub use self::log::LogSink;
pub use self::memory::{MemoryBuffer, MemorySink};

/// Any configured backend
pub enum AnySink {
    File(FileSink),
    Memory(MemorySink),
    Log(LogSink),
}

impl DataSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::File(s) => s.name(),
            Self::Memory(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn needs_header(&mut self) -> Result<bool, ContractError> {
        match self {
            Self::File(s) => s.needs_header().await,
            Self::Memory(s) => s.needs_header().await,
            Self::Log(s) => s.needs_header().await,
        }
    }

    async fn append(&mut self, chunk: &[u8]) -> Result<(), ContractError> {
        match self {
            Self::File(s) => s.append(chunk).await,
            Self::Memory(s) => s.append(chunk).await,
            Self::Log(s) => s.append(chunk).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::File(s) => s.flush().await,
            Self::Memory(s) => s.flush().await,
            Self::Log(s) => s.flush().await,
        }
    }
}

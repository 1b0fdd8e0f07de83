//! DataSink trait - Sink Writer backend interface
//!
//! A backend only moves encoded bytes. Locking, header bookkeeping and row
//! encoding belong to the writer that owns it.

use crate::ContractError;

/// Append-only output backend
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Whether the backing storage is missing or empty, i.e. a header line
    /// must precede the first row.
    async fn needs_header(&mut self) -> Result<bool, ContractError>;

    /// Append one pre-encoded chunk as a single write
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn append(&mut self, chunk: &[u8]) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;
}

//! Lookup trait - external extraction interface
//!
//! One call per work item. Implementations decode the provider payload into
//! typed records before returning, so nothing unvalidated reaches a sink.

use crate::{LookupError, Record, WorkItem};

/// External lookup collaborator
#[trait_variant::make(Lookup: Send)]
pub trait LocalLookup {
    /// Record type produced by this lookup
    type Record: Record;

    /// Lookup name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Extract zero or more records for one item.
    ///
    /// # Errors
    /// Any transport, status or decode failure. The caller records it on the
    /// item's outcome and never retries.
    async fn lookup(&self, item: &WorkItem) -> Result<Vec<Self::Record>, LookupError>;

    /// Fixed result used instead of [`lookup`](Self::lookup) in dry-run mode
    fn synthetic(&self, item: &WorkItem) -> Vec<Self::Record>;
}

//! Classifier trait - record to sink routing

use crate::{Record, SinkTarget};

/// Pure mapping from one record to the sinks it must be appended to.
///
/// Must be deterministic: the same record always yields the same targets, in
/// the same order.
pub trait Classifier<R: Record>: Send + Sync {
    fn classify(&self, record: &R) -> Vec<SinkTarget>;
}

impl<R, F> Classifier<R> for F
where
    R: Record,
    F: Fn(&R) -> Vec<SinkTarget> + Send + Sync,
{
    fn classify(&self, record: &R) -> Vec<SinkTarget> {
        self(record)
    }
}

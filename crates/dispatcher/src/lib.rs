//! # Dispatcher
//!
//! Record output module.
//!
//! Responsible for:
//! - Routing each record to its sink targets (`RuleClassifier`)
//! - Encoding rows and appending them per target (`SinkWriter`)
//! - Keeping targets independent: one lock and one header flag each

pub mod encode;
pub mod error;
pub mod metrics;
pub mod routing;
pub mod sinks;
pub mod writer;

pub use contracts::{Classifier, DataSink, SinkTarget};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use routing::{is_european_or_uk, RouteMatch, RuleClassifier};
pub use sinks::{FileSink, LogSink, MemoryBuffer, MemorySink};
pub use writer::{AppendReport, SinkBackend, SinkRegistration, SinkWriter, SinkWriterBuilder};

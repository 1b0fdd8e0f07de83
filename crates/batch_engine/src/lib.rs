//! # Batch Engine
//!
//! Bounded-concurrency processing of independent work items.
//!
//! Responsible for:
//! - Capping in-flight lookups at `N` with FIFO admission (`ConcurrencyLimiter`)
//! - Running one item from lookup to sink appends without ever failing the
//!   batch (`TaskRunner`)
//! - Aggregating every outcome in input order (`BatchOrchestrator`)
//!
//! ## Usage
//!
//! ```ignore
//! use batch_engine::BatchOrchestrator;
//!
//! let orchestrator = BatchOrchestrator::builder(lookup, classifier, writer)
//!     .concurrency(3)
//!     .observer(observer)
//!     .build()?;
//!
//! let result = orchestrator.run(items).await?;
//! println!("{} succeeded, {} failed", result.succeeded(), result.failed());
//! ```

pub mod limiter;
pub mod orchestrator;
pub mod progress;
pub mod runner;

pub use limiter::{ConcurrencyLimiter, LimiterError, LimiterHandle};
pub use orchestrator::{BatchOrchestrator, BatchOrchestratorBuilder};
pub use progress::{ChannelObserver, FanoutObserver, NoopObserver, ProgressUpdate};
pub use runner::{RunMode, TargetBatch, TaskRunner};

// Re-export contracts types
pub use contracts::{BatchResult, BatchSummary, ProgressEvent, ProgressKind, TaskOutcome};

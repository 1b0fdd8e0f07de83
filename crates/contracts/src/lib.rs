//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Item Model
//! - `WorkItem::index` is the only ordering key; completion order never leaks
//!   into a `BatchResult`
//! - Each item owns exactly one `TaskOutcome`

mod blueprint;
mod classifier;
mod error;
mod item;
mod lookup;
mod outcome;
mod progress;
mod record;
mod sink;
mod sink_target;

pub use blueprint::*;
pub use classifier::Classifier;
pub use error::*;
pub use item::*;
pub use lookup::{LocalLookup, Lookup};
pub use outcome::*;
pub use progress::*;
pub use record::*;
pub use sink::{DataSink, LocalDataSink};
pub use sink_target::SinkTarget;

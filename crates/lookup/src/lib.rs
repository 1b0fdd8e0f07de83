//! # Lookup
//!
//! External extraction collaborators.
//!
//! Responsibilities:
//! - Talk to the Responses API (`OpenAiClient`) behind the `ResponsesClient` seam
//! - Decode model output strictly into typed records
//! - Provide paper-contact and nutrition lookups, plus their dry-run results
//! - Provide deterministic lookups for tests (`MockResponsesClient`, `ScriptedLookup`)

pub mod client;
pub mod decode;
pub mod mock_client;
pub mod nutrition;
pub mod openai_client;
pub mod papers;
pub mod rda;
pub mod scripted;

pub use client::{ResponsesClient, ResponsesRequest};
pub use contracts::{Lookup, LookupError};
pub use mock_client::MockResponsesClient;
pub use nutrition::{NutritionLookup, SERVING_PARAM};
pub use openai_client::OpenAiClient;
pub use papers::PaperContactLookup;
pub use rda::{rda_percentage, RDA_VALUES};
pub use scripted::{ConcurrencyProbe, ProbeGuard, ScriptedLookup};

//! Responses API client abstraction
//!
//! Defines the transport seam between lookups and the remote model, supporting
//! the real HTTP client and mock testing.

use std::future::Future;

use contracts::LookupError;

/// One prompt sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsesRequest {
    pub model: String,
    /// System-level instructions
    pub instructions: String,
    /// User input
    pub input: String,
}

/// Appended to every input so the model answers with bare JSON
pub const JSON_ONLY_SUFFIX: &str = "\n\nIMPORTANT: Return your response as valid JSON only, with no additional text or markdown formatting.";

/// Responses client trait
///
/// Returns the model's output text. Transport, status and empty-output
/// failures map onto [`LookupError`].
pub trait ResponsesClient: Send + Sync {
    fn respond(
        &self,
        request: &ResponsesRequest,
    ) -> impl Future<Output = Result<String, LookupError>> + Send;
}

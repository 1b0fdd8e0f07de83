//! Layered error definitions
//!
//! Categorized by source: config / input / lookup / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Malformed or empty input source. Fatal, raised before any task runs.
    #[error("input error in '{source_name}': {message}")]
    Input {
        source_name: String,
        message: String,
    },

    // ===== Lookup Errors =====
    /// External lookup failed for one item
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),

    // ===== Sink Errors =====
    /// Record routed to a sink that was never registered
    #[error("unknown sink '{sink_name}'")]
    UnknownSink { sink_name: String },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create input error
    pub fn input(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create unknown sink error
    pub fn unknown_sink(sink_name: impl Into<String>) -> Self {
        Self::UnknownSink {
            sink_name: sink_name.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error is fatal for the whole run (input / config class).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::Input { .. }
        )
    }
}

/// Failure of the external lookup for a single work item.
///
/// Recovered locally by the task runner and recorded on that item's outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// No API key configured for a live lookup
    #[error("no API key configured")]
    MissingApiKey,

    /// Provider rejected the credentials
    #[error("authentication failed")]
    Authentication,

    /// Provider rate limit hit (not retried)
    #[error("rate limit exceeded")]
    RateLimited,

    /// Provider temporarily unavailable
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Any other non-success HTTP status
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Response could not be decoded into typed records
    #[error("malformed response: {0}")]
    Decode(String),

    /// Work item lacks a parameter the lookup needs
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    /// Lookup refused the item (scripted or policy failure)
    #[error("{0}")]
    Rejected(String),
}

impl LookupError {
    /// Create decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Map an HTTP status code to the matching variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimited,
            503 => Self::ServiceUnavailable,
            _ => Self::Status {
                status,
                message: message.into(),
            },
        }
    }
}

//! Dispatcher error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while registering sinks
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Two registrations share one target name
    #[error("sink '{0}' registered twice")]
    DuplicateTarget(String),

    /// Two file sinks share one backing path
    #[error("sinks '{first}' and '{second}' both write to {}", path.display())]
    DuplicatePath {
        first: String,
        second: String,
        path: PathBuf,
    },

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}

//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
///
/// Every variant is fatal for the run and surfaces before any task is
/// submitted.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source could not be opened
    #[error("cannot open '{source_name}': {source}")]
    Open {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Required header columns absent
    #[error("CSV must have {} columns", quoted(.columns))]
    MissingColumns {
        source_name: String,
        columns: Vec<&'static str>,
    },

    /// No data rows at all
    #[error("CSV file is empty")]
    Empty { source_name: String },

    /// Data rows present, none usable
    #[error("no usable rows ({skipped} skipped)")]
    NoUsableRows { source_name: String, skipped: usize },

    /// Malformed CSV
    #[error("malformed CSV at line {line}: {message}")]
    Malformed {
        source_name: String,
        line: u64,
        message: String,
    },
}

fn quoted(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(" and ")
}

impl IngestionError {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Open { source_name, .. }
            | Self::MissingColumns { source_name, .. }
            | Self::Empty { source_name }
            | Self::NoUsableRows { source_name, .. }
            | Self::Malformed { source_name, .. } => source_name,
        }
    }

    pub(crate) fn malformed(source_name: &str, err: &csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        Self::Malformed {
            source_name: source_name.to_string(),
            line,
            message: err.to_string(),
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        ContractError::input(err.source_name().to_string(), err.to_string())
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;

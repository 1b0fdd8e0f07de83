//! WorkItem - Ingestion output, one unit of independent work

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter key used for display labels
pub const LABEL_PARAM: &str = "label";

/// Opaque payload handed to the lookup collaborator.
///
/// The engine never interprets these values; only the lookup for the
/// matching profile does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One row of input, processed independently of every other row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Ordinal position in the original input (0-based)
    pub index: usize,

    /// Identifier passed to the lookup (paper link, food name)
    pub identifier: String,

    /// Opaque lookup parameters
    #[serde(default)]
    pub parameters: Parameters,
}

impl WorkItem {
    /// Create a work item
    pub fn new(index: usize, identifier: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            index,
            identifier: identifier.into(),
            parameters,
        }
    }

    /// Human-readable label: the `label` parameter, falling back to the identifier
    pub fn label(&self) -> &str {
        self.parameters
            .get(LABEL_PARAM)
            .unwrap_or(self.identifier.as_str())
    }
}

//! SinkTarget - identity of one append destination
//!
//! Uses `Arc<str>` so every task can hold the target it routes to without
//! allocating.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of a registered output sink.
///
/// A target is created once when sinks are registered and cloned into every
/// routing decision afterwards. Equality and hashing follow the underlying
/// string, so a `HashMap<SinkTarget, _>` can be queried with `&str`.
///
/// # Examples
/// ```
/// use contracts::SinkTarget;
///
/// let primary: SinkTarget = "all_authors".into();
/// assert_eq!(primary, "all_authors");
/// assert_eq!(primary.clone().as_str(), "all_authors");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkTarget(Arc<str>);

impl SinkTarget {
    /// Create a target from a sink name.
    #[inline]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Sink name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SinkTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SinkTarget {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SinkTarget {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SinkTarget {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SinkTarget({:?})", self.0)
    }
}

impl PartialEq<str> for SinkTarget {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SinkTarget {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for SinkTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SinkTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

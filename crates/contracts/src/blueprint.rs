//! JobBlueprint - Config Loader output
//!
//! Describes one complete run: which profile to execute, where the input
//! lives, how many lookups may be in flight, and where records are written.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{AuthorContact, NutrientRecord, Record};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    pub job: JobConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    /// Output routing; filled with the profile defaults when omitted
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Which extraction the run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Research papers to author contacts
    Papers,
    /// Ingredients to nutrient facts
    Nutrition,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Papers => "papers",
            Self::Nutrition => "nutrition",
        }
    }

    /// Column header of the record type this profile produces
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Self::Papers => AuthorContact::HEADER,
            Self::Nutrition => NutrientRecord::HEADER,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Papers => "o3-pro",
            Self::Nutrition => "gpt-4o",
        }
    }

    /// Sinks used when a config does not declare any
    pub fn default_sinks(self) -> Vec<SinkConfig> {
        match self {
            Self::Papers => vec![
                SinkConfig::file("all_authors", "all_authors.csv", RouteRule::All),
                SinkConfig::file(
                    "european_authors",
                    "european_authors.csv",
                    RouteRule::European {
                        field: "Nationality".into(),
                    },
                ),
            ],
            Self::Nutrition => vec![SinkConfig::file(
                "nutrients",
                "nutrition_facts.csv",
                RouteRule::All,
            )],
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job settings consumed by the batch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub profile: Profile,

    /// Tabular input source
    pub input: PathBuf,

    /// Maximum lookups in flight, must be >= 1
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Replace the lookup with a synthetic result and skip all sink writes
    #[serde(default)]
    pub dry_run: bool,

    /// Simulated latency per item in dry-run mode
    #[serde(default)]
    pub dry_run_delay_ms: u64,

    /// Process only the first `limit` items
    #[serde(default)]
    pub limit: Option<usize>,

    /// Directory for run reports (nutrition JSON)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_concurrency() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl JobConfig {
    pub fn new(profile: Profile, input: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            input: input.into(),
            concurrency: default_concurrency(),
            dry_run: false,
            dry_run_delay_ms: 0,
            limit: None,
            output_dir: default_output_dir(),
        }
    }
}

/// Remote lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Model name; the profile default when absent
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Sink output config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name, unique per run
    pub name: String,

    pub sink_type: SinkType,

    /// Backing file, required for `file` sinks
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Which records are appended here
    #[serde(default)]
    pub route: RouteRule,
}

impl SinkConfig {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, route: RouteRule) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::File,
            path: Some(path.into()),
            route,
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Append to a CSV file
    File,
    /// In-process buffer
    Memory,
    /// Log output
    Log,
}

/// Routing rule of one sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteRule {
    /// Every record
    #[default]
    All,
    /// Records whose `field` names a European or UK country/nationality
    European { field: String },
    /// Records whose `field` equals one of `values`, ignoring case
    AnyOf { field: String, values: Vec<String> },
    /// Registered but never routed to
    Never,
}

impl RouteRule {
    /// Column this rule reads, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::European { field } | Self::AnyOf { field, .. } => Some(field),
            Self::All | Self::Never => None,
        }
    }
}

impl JobBlueprint {
    /// Blueprint with the profile's default lookup and sinks
    pub fn for_profile(profile: Profile, input: impl Into<PathBuf>) -> Self {
        Self {
            version: ConfigVersion::V1,
            job: JobConfig::new(profile, input),
            lookup: LookupConfig::default(),
            sinks: profile.default_sinks(),
        }
    }

    /// Model resolved against the profile default
    pub fn model(&self) -> &str {
        self.lookup
            .model
            .as_deref()
            .unwrap_or(self.job.profile.default_model())
    }

    /// Fill in profile defaults for omitted sections
    pub fn apply_defaults(&mut self) {
        if self.sinks.is_empty() {
            self.sinks = self.job.profile.default_sinks();
        }
    }

    /// Sink configs with relative file paths placed under `job.output_dir`
    pub fn resolved_sinks(&self) -> Vec<SinkConfig> {
        self.sinks
            .iter()
            .cloned()
            .map(|mut sink| {
                if let Some(path) = sink.path.as_mut() {
                    if path.is_relative() {
                        *path = self.job.output_dir.join(&*path);
                    }
                }
                sink
            })
            .collect()
    }
}

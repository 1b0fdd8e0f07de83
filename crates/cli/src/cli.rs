//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::Profile;
use std::path::PathBuf;

/// Extractor - bounded-concurrency lookup and CSV extraction
#[derive(Parser, Debug)]
#[command(
    name = "extractor",
    author,
    version,
    about = "Bounded-concurrency batch extractor",
    long_about = "Reads work items from a CSV file, runs one model lookup per item with a \n\
                  fixed concurrency cap, and appends the extracted records to one or more \n\
                  CSV sinks.\n\n\
                  Profiles: `papers` (author contacts) and `nutrition` (nutrient facts)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EXTRACTOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "EXTRACTOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every input row
    Run(RunArgs),

    /// Validate configuration and input header without running
    Validate(ValidateArgs),

    /// Display the resolved configuration
    Info(InfoArgs),
}

/// Where the job comes from: a config file, or a profile plus input
#[derive(Parser, Debug, Clone)]
pub struct JobSource {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "EXTRACTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to run when no configuration file is given
    #[arg(short, long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Input CSV; overrides `job.input`
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: JobSource,

    /// Maximum lookups in flight; overrides `job.concurrency`
    #[arg(short = 'n', long, env = "EXTRACTOR_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Use synthetic results and write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Simulated latency per item in dry-run mode
    #[arg(long)]
    pub dry_run_delay_ms: Option<u64>,

    /// Process only the first N rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory for relative sink paths and reports
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Model name; overrides `lookup.model`
    #[arg(long)]
    pub model: Option<String>,

    /// OpenAI API key (or use OPENAI_API_KEY env var)
    #[arg(short = 'k', long, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Progress display
    #[arg(long, value_enum, default_value = "table", env = "EXTRACTOR_PROGRESS")]
    pub progress: ProgressStyleArg,

    /// Prometheus metrics port (unset = disabled)
    #[arg(long, env = "EXTRACTOR_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: JobSource,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: JobSource,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Profile selector
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileArg {
    /// Research papers to author contacts
    Papers,
    /// Ingredients to nutrient facts
    Nutrition,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Papers => Profile::Papers,
            ProfileArg::Nutrition => Profile::Nutrition,
        }
    }
}

/// Progress display style
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgressStyleArg {
    /// One log line per transition
    Log,
    /// Live status table
    #[default]
    Table,
    /// Progress bar
    Bar,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

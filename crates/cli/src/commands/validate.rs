//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{JobBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::{JobSource, ValidateArgs};

use super::load_blueprint;

/// Concurrency above which the API is likely to rate-limit
const HIGH_CONCURRENCY: usize = 16;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    profile: String,
    input: String,
    concurrency: usize,
    sink_count: usize,
    input_columns: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config_path = describe_source(&args.source);
    info!(config = %config_path, "Validating configuration");

    let result = match validate_job(&args.source) {
        Ok((blueprint, input_columns)) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    profile: blueprint.job.profile.to_string(),
                    input: blueprint.job.input.display().to_string(),
                    concurrency: blueprint.job.concurrency,
                    sink_count: blueprint.sinks.len(),
                    input_columns,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn describe_source(source: &JobSource) -> String {
    match (&source.config, source.profile) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(profile)) => format!("--profile {:?}", profile).to_lowercase(),
        (None, None) => "(none)".to_string(),
    }
}

/// Load the blueprint and check the input header of its profile
fn validate_job(source: &JobSource) -> Result<(JobBlueprint, Vec<String>)> {
    let blueprint = load_blueprint(source)?;
    config_loader::ConfigLoader::validate(&blueprint)?;

    let input = &blueprint.job.input;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let columns = ingestion::check_input(blueprint.job.profile, input)
        .with_context(|| format!("Input {} is not usable", input.display()))?;
    Ok((blueprint, columns))
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &JobBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.job.dry_run {
        warnings.push("job.dry_run is set - no records will be written".to_string());
    }

    if blueprint.job.concurrency > HIGH_CONCURRENCY {
        warnings.push(format!(
            "job.concurrency = {} may hit API rate limits",
            blueprint.job.concurrency
        ));
    }

    for sink in &blueprint.sinks {
        if sink.sink_type == SinkType::Memory {
            warnings.push(format!(
                "Sink '{}' is in-memory - its rows are lost when the run ends",
                sink.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Profile: {}", summary.profile);
            println!("  Input: {}", summary.input);
            println!("  Input columns: {}", summary.input_columns.join(", "));
            println!("  Concurrency: {}", summary.concurrency);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProfileArg;
    use contracts::{Profile, RouteRule, SinkConfig};

    #[test]
    fn test_header_checked() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("papers.csv");
        std::fs::write(&input, "Section,PaperName,Link\nNLP,Attention,https://a\n").unwrap();

        let source = JobSource {
            config: None,
            profile: Some(ProfileArg::Papers),
            input: Some(input.clone()),
        };
        let (_, columns) = validate_job(&source).unwrap();
        assert_eq!(columns, vec!["Section", "PaperName", "Link"]);

        std::fs::write(&input, "Section,Title\nNLP,Attention\n").unwrap();
        assert!(validate_job(&source).is_err());
    }

    #[test]
    fn test_missing_input_is_invalid() {
        let source = JobSource {
            config: None,
            profile: Some(ProfileArg::Nutrition),
            input: Some("definitely-missing.csv".into()),
        };
        let err = validate_job(&source).unwrap_err().to_string();
        assert!(err.contains("Input file not found"), "got: {err}");
    }

    #[test]
    fn test_warnings() {
        let mut blueprint = JobBlueprint::for_profile(Profile::Papers, "p.csv");
        assert!(collect_warnings(&blueprint).is_empty());

        blueprint.job.dry_run = true;
        blueprint.job.concurrency = 32;
        blueprint.sinks.push(SinkConfig {
            name: "scratch".into(),
            sink_type: SinkType::Memory,
            path: None,
            route: RouteRule::All,
        });
        let warnings = collect_warnings(&blueprint);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[2].contains("scratch"));
    }
}

//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{JobBlueprint, RouteRule, SinkConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

use super::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct JobInfo {
    version: String,
    profile: String,
    input: String,
    required_columns: Vec<&'static str>,
    record_columns: Vec<&'static str>,
    concurrency: usize,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    output_dir: String,
    lookup: LookupInfo,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct LookupInfo {
    model: String,
    api_base: String,
    request_timeout_secs: u64,
    api_key_env: String,
    api_key_present: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    route: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.source)?;
    info!(profile = %blueprint.job.profile, "Loading configuration info");

    let job_info = build_job_info(&blueprint);
    if args.json {
        let json =
            serde_json::to_string_pretty(&job_info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_job_info(&job_info);
    }

    Ok(())
}

fn build_job_info(blueprint: &JobBlueprint) -> JobInfo {
    let job = &blueprint.job;
    JobInfo {
        version: format!("{:?}", blueprint.version),
        profile: job.profile.to_string(),
        input: job.input.display().to_string(),
        required_columns: ingestion::required_columns(job.profile).to_vec(),
        record_columns: job.profile.header().to_vec(),
        concurrency: job.concurrency,
        dry_run: job.dry_run,
        limit: job.limit,
        output_dir: job.output_dir.display().to_string(),
        lookup: LookupInfo {
            model: blueprint.model().to_string(),
            api_base: blueprint.lookup.api_base.clone(),
            request_timeout_secs: blueprint.lookup.request_timeout_secs,
            api_key_env: blueprint.lookup.api_key_env.clone(),
            api_key_present: std::env::var(&blueprint.lookup.api_key_env).is_ok(),
        },
        sinks: blueprint.resolved_sinks().iter().map(sink_info).collect(),
    }
}

fn sink_info(sink: &SinkConfig) -> SinkInfo {
    SinkInfo {
        name: sink.name.clone(),
        sink_type: format!("{:?}", sink.sink_type).to_lowercase(),
        path: sink.path.as_ref().map(|p| p.display().to_string()),
        route: describe_route(&sink.route),
    }
}

fn describe_route(rule: &RouteRule) -> String {
    match rule {
        RouteRule::All => "all records".to_string(),
        RouteRule::European { field } => format!("{field} is European or UK"),
        RouteRule::AnyOf { field, values } => format!("{field} in [{}]", values.join(", ")),
        RouteRule::Never => "never".to_string(),
    }
}

fn print_job_info(info: &JobInfo) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Job Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📋 Job");
    println!("   ├─ Profile: {}", info.profile);
    println!("   ├─ Input: {}", info.input);
    println!("   ├─ Required columns: {}", info.required_columns.join(", "));
    println!("   ├─ Concurrency: {}", info.concurrency);
    println!("   ├─ Dry run: {}", info.dry_run);
    if let Some(limit) = info.limit {
        println!("   ├─ Limit: {}", limit);
    }
    println!("   └─ Output dir: {}", info.output_dir);

    println!("\n🔎 Lookup");
    println!("   ├─ Model: {}", info.lookup.model);
    println!("   ├─ API base: {}", info.lookup.api_base);
    println!("   ├─ Timeout: {}s", info.lookup.request_timeout_secs);
    println!(
        "   └─ API key: ${} ({})",
        info.lookup.api_key_env,
        if info.lookup.api_key_present {
            "set"
        } else {
            "not set"
        }
    );

    println!("\n📤 Sinks ({})", info.sinks.len());
    for sink in &info.sinks {
        println!("   ├─ {} [{}]", sink.name, sink.sink_type);
        if let Some(path) = &sink.path {
            println!("   │   ├─ path: {}", path);
        }
        println!("   │   └─ route: {}", sink.route);
    }
    println!("   └─ columns: {}", info.record_columns.join(", "));

    println!();
}

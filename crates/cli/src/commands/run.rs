//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::JobBlueprint;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

use super::load_blueprint;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(&args.source)?;

    // Apply CLI overrides
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Invalid configuration after command-line overrides")?;

    let api_key = resolve_api_key(args.api_key.as_deref(), &blueprint);
    if api_key.is_none() && !blueprint.job.dry_run {
        anyhow::bail!(
            "OpenAI API key not provided. Use --api-key or set {} env var",
            blueprint.lookup.api_key_env
        );
    }

    info!(
        profile = %blueprint.job.profile,
        input = %blueprint.job.input.display(),
        concurrency = blueprint.job.concurrency,
        dry_run = blueprint.job.dry_run,
        model = blueprint.model(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        api_key,
        progress: args.progress,
    });

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Run failed")?;
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, in-flight items are abandoned");
        }
    }

    Ok(())
}

fn apply_overrides(blueprint: &mut JobBlueprint, args: &RunArgs) {
    let job = &mut blueprint.job;
    if let Some(concurrency) = args.concurrency {
        info!(concurrency, "Overriding concurrency from CLI");
        job.concurrency = concurrency;
    }
    if args.dry_run {
        job.dry_run = true;
    }
    if let Some(delay) = args.dry_run_delay_ms {
        job.dry_run_delay_ms = delay;
    }
    if args.limit.is_some() {
        job.limit = args.limit;
    }
    if let Some(dir) = &args.output_dir {
        job.output_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        blueprint.lookup.model = Some(model.clone());
    }
}

/// `--api-key`, then the configured environment variable
fn resolve_api_key(flag: Option<&str>, blueprint: &JobBlueprint) -> Option<String> {
    flag.map(str::to_owned)
        .or_else(|| std::env::var(&blueprint.lookup.api_key_env).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Resolves on Ctrl+C; never resolves when the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

//! Pipeline orchestrator - wires ingestion, lookup, batch engine and sinks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use batch_engine::{BatchOrchestrator, BatchResult, ChannelObserver};
use contracts::{JobBlueprint, Lookup, NutrientRecord, Profile, Record, WorkItem};
use dispatcher::{RuleClassifier, SinkBackend, SinkWriter};
use lookup::{NutritionLookup, OpenAiClient, PaperContactLookup};
use tracing::{debug, info, warn};

use super::progress::spawn_renderer;
use super::report::NutritionReport;
use super::stats::{RunStats, SinkOutput};
use crate::cli::ProgressStyleArg;

/// Key handed to the HTTP client when a dry run has none; never sent
const DRY_RUN_API_KEY: &str = "dry-run";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Resolved job, overrides already applied
    pub blueprint: JobBlueprint,

    /// OpenAI API key; optional only for dry runs
    pub api_key: Option<String>,

    /// Progress display
    pub progress: ProgressStyleArg,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let job = &blueprint.job;

        info!(input = %job.input.display(), "Loading work items...");
        let items = ingestion::load_items(job.profile, &job.input, job.limit)
            .with_context(|| format!("Failed to read items from {}", job.input.display()))?;
        info!(items = items.len(), "Work items loaded");

        let api_key = match (&self.config.api_key, job.dry_run) {
            (Some(key), _) => key.clone(),
            (None, true) => DRY_RUN_API_KEY.to_string(),
            (None, false) => anyhow::bail!("OpenAI API key not provided"),
        };
        let client = OpenAiClient::new(api_key, &blueprint.lookup)
            .context("Failed to create OpenAI client")?;
        debug!(endpoint = client.endpoint(), model = blueprint.model(), "Lookup client ready");

        let mut stats = match job.profile {
            Profile::Papers => {
                let lookup = PaperContactLookup::new(client, blueprint.model());
                self.execute(lookup, items).await?.0
            }
            Profile::Nutrition => {
                let lookup = NutritionLookup::new(client, blueprint.model());
                let (mut stats, result) = self.execute(lookup, items).await?;
                if !job.dry_run {
                    stats.report_path = Some(self.write_report(&result)?);
                }
                stats
            }
        };

        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    /// Run one batch for `lookup` and collect its statistics
    async fn execute<L>(
        &self,
        lookup: L,
        items: Vec<WorkItem>,
    ) -> Result<(RunStats, BatchResult<L::Record>)>
    where
        L: Lookup + Send + Sync + 'static,
    {
        let job = &self.config.blueprint.job;
        let sinks = self.config.blueprint.resolved_sinks();

        info!(sinks = sinks.len(), "Setting up sinks...");
        let writer = Arc::new(
            SinkWriter::<L::Record>::from_configs(&sinks).context("Failed to create sinks")?,
        );
        let classifier = RuleClassifier::from_configs(&sinks);

        let (observer, progress_rx) = ChannelObserver::new();
        let renderer = spawn_renderer(self.config.progress, progress_rx);

        let mut builder = BatchOrchestrator::builder(lookup, classifier, Arc::clone(&writer))
            .concurrency(job.concurrency)
            .observer(Arc::new(observer));
        if job.dry_run {
            info!(delay_ms = job.dry_run_delay_ms, "Dry run: synthetic results, no writes");
            builder = builder.dry_run(Duration::from_millis(job.dry_run_delay_ms));
        }
        let orchestrator = builder.build().context("Failed to build batch orchestrator")?;

        let items_loaded = items.len();
        let result = orchestrator.run(items).await;

        // Dropping the orchestrator releases the last progress sender.
        drop(orchestrator);
        if let Err(e) = renderer.await {
            warn!(error = %e, "Progress renderer stopped unexpectedly");
        }

        let result = result.context("Batch rejected")?;
        writer.flush_all().await.context("Failed to flush sinks")?;

        let stats = collect_stats(&result, &writer, items_loaded, job.dry_run);
        debug!("{}", stats.run_metrics.summary());
        Ok((stats, result))
    }

    fn write_report(&self, result: &BatchResult<NutrientRecord>) -> Result<std::path::PathBuf> {
        let report = NutritionReport::from_result(result);
        report.print();
        let path = report.save(&self.config.blueprint.job.output_dir)?;
        info!(path = %path.display(), "Nutrition report saved");
        Ok(path)
    }
}

fn collect_stats<R: Record>(
    result: &BatchResult<R>,
    writer: &SinkWriter<R>,
    items_loaded: usize,
    dry_run: bool,
) -> RunStats {
    let mut stats = RunStats {
        items_loaded,
        dry_run,
        ..Default::default()
    };

    for outcome in result.outcomes() {
        stats.run_metrics.update(outcome);
        if let Some(failure) = &outcome.failure {
            stats
                .failures
                .push((outcome.item.label().to_string(), failure.clone()));
        }
    }

    for (target, snapshot) in writer.all_metrics() {
        stats
            .run_metrics
            .record_sink_rows(target.as_str(), snapshot.row_count);
        let path = match writer.backend(target.as_str()) {
            Some(SinkBackend::File { path }) => Some(path.clone()),
            _ => None,
        };
        stats.outputs.push(SinkOutput {
            name: target.to_string(),
            path,
            rows: snapshot.row_count,
            failures: snapshot.failure_count,
        });
    }

    stats
}

//! Run statistics and final summary.

use std::path::PathBuf;
use std::time::Duration;

use observability::RunMetricsAggregator;

/// One sink as reported after the run
#[derive(Debug, Clone)]
pub struct SinkOutput {
    pub name: String,
    /// Backing file, `None` for memory and log sinks
    pub path: Option<PathBuf>,
    pub rows: u64,
    pub failures: u64,
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Items taken from the input
    pub items_loaded: usize,

    /// Per-item aggregation
    pub run_metrics: RunMetricsAggregator,

    /// Sinks in registration order
    pub outputs: Vec<SinkOutput>,

    /// `(label, error)` of every failed item, in input order
    pub failures: Vec<(String, String)>,

    /// Nutrition report written in the output directory
    pub report_path: Option<PathBuf>,

    pub dry_run: bool,

    /// Total duration of the run
    pub duration: Duration,
}

impl RunStats {
    /// Items per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.run_metrics.total_items as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.run_metrics.summary();

        println!("\n✨ Processing complete!");
        println!(
            "   ├─ Items processed: {}/{}",
            summary.succeeded, self.items_loaded
        );
        println!("   ├─ Records extracted: {}", summary.records_extracted);
        println!("   ├─ Records written: {}", summary.records_written);
        println!("   ├─ Errors: {}", summary.failed);
        println!(
            "   └─ Duration: {:.2}s ({:.2} items/s)",
            self.duration.as_secs_f64(),
            self.throughput()
        );

        if self.dry_run {
            println!("\n🧪 Dry run: nothing was written");
        } else if !self.outputs.is_empty() {
            println!("\n📁 Output files");
            for output in &self.outputs {
                let location = output
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not on disk)".to_string());
                println!(
                    "   ├─ {}: {} ({} rows, {} failed appends)",
                    output.name, location, output.rows, output.failures
                );
            }
            if let Some(report) = &self.report_path {
                println!("   └─ report: {}", report.display());
            }
        }

        if !self.failures.is_empty() {
            println!("\n⚠️  Failed items");
            for (label, error) in &self.failures {
                println!("   ├─ {}: {}", label, error);
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let mut stats = RunStats::default();
        assert_eq!(stats.throughput(), 0.0);

        stats.run_metrics.total_items = 10;
        stats.duration = Duration::from_secs(4);
        assert!((stats.throughput() - 2.5).abs() < f64::EPSILON);
    }
}

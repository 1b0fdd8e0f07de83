//! Progress renderers.
//!
//! Every renderer consumes the orchestrator's [`ProgressUpdate`] stream on its
//! own task and stops at `Finished` or when the channel closes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use batch_engine::{BatchSummary, ProgressKind, ProgressUpdate};
use contracts::ItemStatus;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::ProgressStyleArg;

const LABEL_WIDTH: usize = 47;
const HEAD_ROWS: usize = 5;
const RECENT_ROWS: usize = 3;
const REDRAW_INTERVAL: Duration = Duration::from_millis(500);
const BAR_TEMPLATE: &str =
    "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta} @ {per_sec}) {msg}";

/// Start the renderer for `style`
pub fn spawn_renderer(
    style: ProgressStyleArg,
    rx: UnboundedReceiver<ProgressUpdate>,
) -> JoinHandle<()> {
    match style {
        ProgressStyleArg::Log => tokio::spawn(render_log(rx)),
        ProgressStyleArg::Table => tokio::spawn(render_table(rx)),
        ProgressStyleArg::Bar => tokio::spawn(render_bar(rx)),
    }
}

async fn render_log(mut rx: UnboundedReceiver<ProgressUpdate>) {
    while let Some(update) = rx.recv().await {
        match update {
            ProgressUpdate::Started { total, concurrency } => {
                info!(total, concurrency, "Batch started");
            }
            ProgressUpdate::Item(event) => match event.kind {
                ProgressKind::Pending => debug!(item = event.index, label = %event.label, "Queued"),
                ProgressKind::Processing => {
                    info!(item = event.index, label = %event.label, "Processing")
                }
                ProgressKind::Completed { records, elapsed } => info!(
                    item = event.index,
                    label = %event.label,
                    records,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Completed"
                ),
                ProgressKind::Failed { error, elapsed } => warn!(
                    item = event.index,
                    label = %event.label,
                    error = %error,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Failed"
                ),
            },
            ProgressUpdate::Finished { summary, elapsed } => {
                info!(
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    records = summary.records_written,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Batch finished"
                );
                break;
            }
        }
    }
}

async fn render_table(mut rx: UnboundedReceiver<ProgressUpdate>) {
    let interactive = std::io::stdout().is_terminal();
    let mut table = StatusTable::new();
    let mut drawn_lines = 0usize;
    let mut last_draw: Option<Instant> = None;

    while let Some(update) = rx.recv().await {
        let finished = matches!(update, ProgressUpdate::Finished { .. });
        let forced = finished || matches!(update, ProgressUpdate::Started { .. });
        table.apply(update);

        // Without a terminal only the final table is printed.
        let due = last_draw.map_or(true, |at| at.elapsed() >= REDRAW_INTERVAL);
        if finished || (interactive && (forced || due)) {
            let text = table.render();
            let mut stdout = std::io::stdout().lock();
            if interactive && drawn_lines > 0 {
                let _ = write!(stdout, "\x1b[{drawn_lines}A\x1b[J");
            }
            let _ = write!(stdout, "{text}");
            let _ = stdout.flush();
            drawn_lines = text.lines().count();
            last_draw = Some(Instant::now());
        }

        if finished {
            break;
        }
    }
}

async fn render_bar(mut rx: UnboundedReceiver<ProgressUpdate>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(update) = rx.recv().await {
        match update {
            ProgressUpdate::Started { total, .. } => {
                let pb = ProgressBar::new(total as u64);
                match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                    Ok(style) => pb.set_style(style.progress_chars("=> ")),
                    Err(e) => warn!(error = %e, "Invalid progress bar template"),
                }
                pb.set_message("Starting processing...");
                bar = Some(pb);
            }
            ProgressUpdate::Item(event) => {
                let Some(pb) = &bar else { continue };
                match event.kind {
                    ProgressKind::Pending => {}
                    ProgressKind::Processing => pb.set_message(truncate(&event.label, 30)),
                    ProgressKind::Completed { .. } => pb.inc(1),
                    ProgressKind::Failed { error, .. } => {
                        pb.println(format!("✗ {}: {}", truncate(&event.label, LABEL_WIDTH), error));
                        pb.inc(1);
                    }
                }
            }
            ProgressUpdate::Finished { summary, .. } => {
                if let Some(pb) = &bar {
                    pb.finish_with_message(format!(
                        "{} succeeded, {} failed",
                        summary.succeeded, summary.failed
                    ));
                }
                break;
            }
        }
    }
}

#[derive(Debug, Clone)]
struct TableRow {
    label: String,
    status: ItemStatus,
    elapsed: Option<Duration>,
    records: Option<usize>,
    error: Option<String>,
}

/// In-memory status table fed by progress updates
#[derive(Debug, Default)]
pub struct StatusTable {
    rows: BTreeMap<usize, TableRow>,
    recent: VecDeque<usize>,
    total: usize,
    concurrency: usize,
    finished: Option<(BatchSummary, Duration)>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::Started { total, concurrency } => {
                self.total = total;
                self.concurrency = concurrency;
            }
            ProgressUpdate::Item(event) => {
                let status = event.kind.status();
                let row = self.rows.entry(event.index).or_insert_with(|| TableRow {
                    label: event.label.clone(),
                    status,
                    elapsed: None,
                    records: None,
                    error: None,
                });
                row.status = status;
                match event.kind {
                    ProgressKind::Completed { records, elapsed } => {
                        row.records = Some(records);
                        row.elapsed = Some(elapsed);
                    }
                    ProgressKind::Failed { error, elapsed } => {
                        row.error = Some(error);
                        row.elapsed = Some(elapsed);
                    }
                    ProgressKind::Pending | ProgressKind::Processing => {}
                }
                if status.is_terminal() {
                    self.recent.push_back(event.index);
                    if self.recent.len() > RECENT_ROWS {
                        self.recent.pop_front();
                    }
                }
            }
            ProgressUpdate::Finished { summary, elapsed } => {
                self.finished = Some((summary, elapsed));
            }
        }
    }

    fn count(&self, status: ItemStatus) -> usize {
        self.rows.values().filter(|r| r.status == status).count()
    }

    /// Rows worth showing: the head of the input, everything in flight and
    /// the most recently finished items
    fn visible(&self) -> BTreeSet<usize> {
        let mut shown: BTreeSet<usize> = self.rows.keys().take(HEAD_ROWS).copied().collect();
        shown.extend(
            self.rows
                .iter()
                .filter(|(_, r)| r.status == ItemStatus::Processing)
                .map(|(i, _)| *i),
        );
        shown.extend(self.recent.iter().copied());
        shown
    }

    pub fn render(&self) -> String {
        let completed = self.count(ItemStatus::Completed);
        let failed = self.count(ItemStatus::Failed);
        let processing = self.count(ItemStatus::Processing);
        let pending = self.count(ItemStatus::Pending);

        let mut out = String::new();
        out.push_str(&format!(
            "Progress: {}/{} done | {} processing | {} pending | {} failed | concurrency {}\n",
            completed + failed,
            self.total,
            processing,
            pending,
            failed,
            self.concurrency
        ));
        out.push_str(&format!(
            "{:>4}  {:<width$}  {:<10}  {:>8}  {:>7}\n",
            "#",
            "Item",
            "Status",
            "Time",
            "Records",
            width = LABEL_WIDTH
        ));
        out.push_str(&format!("{}\n", "-".repeat(LABEL_WIDTH + 37)));

        let shown = self.visible();
        for index in &shown {
            let Some(row) = self.rows.get(index) else { continue };
            let time = row
                .elapsed
                .map(|e| format!("{:.1}s", e.as_secs_f64()))
                .unwrap_or_else(|| "-".to_string());
            let records = row
                .records
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{:>4}  {:<width$}  {:<10}  {:>8}  {:>7}\n",
                index + 1,
                truncate(&row.label, LABEL_WIDTH),
                row.status.as_str(),
                time,
                records,
                width = LABEL_WIDTH
            ));
        }
        let hidden = self.rows.len().saturating_sub(shown.len());
        if hidden > 0 {
            out.push_str(&format!("      ... {hidden} more\n"));
        }

        if let Some((summary, elapsed)) = &self.finished {
            out.push_str(&format!(
                "Finished in {:.1}s: {} succeeded, {} failed, {} records written\n",
                elapsed.as_secs_f64(),
                summary.succeeded,
                summary.failed,
                summary.records_written
            ));
            let errors: Vec<_> = self
                .rows
                .iter()
                .filter_map(|(i, r)| r.error.as_ref().map(|e| (i, &r.label, e)))
                .collect();
            if !errors.is_empty() {
                out.push_str("Errors:\n");
                for (index, label, error) in errors {
                    out.push_str(&format!(
                        "  #{} {}: {}\n",
                        index + 1,
                        truncate(label, LABEL_WIDTH),
                        error
                    ));
                }
            }
        }
        out
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

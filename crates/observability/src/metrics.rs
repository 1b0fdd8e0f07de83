//! 批处理指标收集模块
//!
//! 基于 TaskOutcome 与 Sink 追加结果收集运行指标。

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{ItemStatus, TaskOutcome};
use metrics::{counter, gauge, histogram};

/// 记录条目结束 (completed / failed)
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_item_finished;
///
/// let outcome = runner.run(item).await;
/// record_item_finished(outcome.status(), outcome.elapsed);
/// ```
pub fn record_item_finished(status: ItemStatus, elapsed: Duration) {
    counter!(
        "extractor_items_total",
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "extractor_item_duration_ms",
        "status" => status.as_str()
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录一次外部查询耗时
pub fn record_lookup_ms(lookup: &str, elapsed: Duration, success: bool) {
    let status = if success { "success" } else { "failure" };
    histogram!(
        "extractor_lookup_ms",
        "lookup" => lookup.to_string(),
        "status" => status
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录写入某个 sink 的行数
pub fn record_records_written(sink_name: &str, rows: usize) {
    counter!(
        "extractor_records_written_total",
        "sink" => sink_name.to_string()
    )
    .increment(rows as u64);
}

/// 记录一次 sink 追加耗时 (含等锁时间)
pub fn record_sink_append_ms(sink_name: &str, elapsed: Duration, success: bool) {
    let status = if success { "success" } else { "failure" };
    histogram!(
        "extractor_sink_append_ms",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

/// 记录当前执行中的任务数
pub fn record_in_flight(in_flight: usize) {
    gauge!("extractor_in_flight").set(in_flight as f64);
}

/// 运行指标聚合器
///
/// 在内存中聚合指标，便于输出最终摘要。
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    /// 条目总数
    pub total_items: u64,

    /// 成功条目数
    pub succeeded: u64,

    /// 失败条目数
    pub failed: u64,

    /// 提取记录总数
    pub records_extracted: u64,

    /// 写入记录总数 (所有 sink 之和)
    pub records_written: u64,

    /// 单条目耗时统计 (毫秒)
    pub item_time_stats: RunningStats,

    /// 各 sink 写入行数
    pub rows_per_sink: BTreeMap<String, u64>,
}

impl RunMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一个条目的结果
    pub fn update<R>(&mut self, outcome: &TaskOutcome<R>) {
        self.total_items += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.records_extracted += outcome.records.len() as u64;
        self.records_written += outcome.records_written as u64;
        self.item_time_stats
            .push(outcome.elapsed.as_secs_f64() * 1000.0);
    }

    /// 累加某个 sink 的写入行数
    pub fn record_sink_rows(&mut self, sink_name: &str, rows: u64) {
        *self.rows_per_sink.entry(sink_name.to_string()).or_insert(0) += rows;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RunMetricsSummary {
        RunMetricsSummary {
            total_items: self.total_items,
            succeeded: self.succeeded,
            failed: self.failed,
            records_extracted: self.records_extracted,
            records_written: self.records_written,
            success_rate: if self.total_items > 0 {
                self.succeeded as f64 / self.total_items as f64 * 100.0
            } else {
                0.0
            },
            item_time_ms: StatsSummary::from(&self.item_time_stats),
            rows_per_sink: self.rows_per_sink.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct RunMetricsSummary {
    pub total_items: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub records_extracted: u64,
    pub records_written: u64,
    pub success_rate: f64,
    pub item_time_ms: StatsSummary,
    pub rows_per_sink: BTreeMap<String, u64>,
}

impl std::fmt::Display for RunMetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Metrics Summary ===")?;
        writeln!(
            f,
            "Items: {} ({} succeeded, {} failed, {:.1}% success)",
            self.total_items, self.succeeded, self.failed, self.success_rate
        )?;
        writeln!(f, "Records extracted: {}", self.records_extracted)?;
        writeln!(f, "Records written: {}", self.records_written)?;
        writeln!(f, "Item time (ms): {}", self.item_time_ms)?;

        if !self.rows_per_sink.is_empty() {
            writeln!(f, "Rows per sink:")?;
            for (sink, rows) in &self.rows_per_sink {
                writeln!(f, "  {}: {}", sink, rows)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1} (n={})",
                self.min, self.max, self.mean, self.count
            )
        }
    }
}

/// 在线统计计算器 (增量均值)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.mean += (value - self.mean) / self.count as f64;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AuthorContact, WorkItem};

    fn contact(link: &str) -> AuthorContact {
        AuthorContact {
            name: "A".into(),
            nationality: "France".into(),
            linkedin: String::new(),
            email: String::new(),
            paper_link: link.into(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [10.0, 20.0, 30.0, 40.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 4);
        assert!((stats.mean() - 25.0).abs() < 1e-10);
        assert!((stats.min() - 10.0).abs() < 1e-10);
        assert!((stats.max() - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = RunMetricsAggregator::new();

        let ok = TaskOutcome::completed(
            WorkItem::new(0, "l0", Default::default()),
            vec![contact("l0"), contact("l0")],
            3,
        )
        .with_elapsed(Duration::from_millis(20));
        let failed = TaskOutcome::<AuthorContact>::failed(
            WorkItem::new(1, "l1", Default::default()),
            "rate limit exceeded",
        );

        aggregator.update(&ok);
        aggregator.update(&failed);
        aggregator.record_sink_rows("all", 2);
        aggregator.record_sink_rows("all", 1);

        let summary = aggregator.summary();
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records_extracted, 2);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.rows_per_sink.get("all"), Some(&3));
        assert!((summary.success_rate - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunMetricsSummary {
            total_items: 5,
            succeeded: 4,
            failed: 1,
            records_extracted: 8,
            records_written: 8,
            success_rate: 80.0,
            item_time_ms: StatsSummary::default(),
            rows_per_sink: BTreeMap::from([("all_authors".to_string(), 8)]),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Items: 5 (4 succeeded, 1 failed, 80.0% success)"));
        assert!(output.contains("all_authors: 8"));
        assert!(output.contains("Item time (ms): N/A"));
    }
}

//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 批处理引擎端到端场景（并发上限、失败隔离、输出顺序）
//! - 多 sink 写入场景（表头只写一次、行不交错、目标互不影响）
//! - 配置 -> 读取 -> 运行 的完整链路

#[cfg(test)]
mod support {
    use contracts::{AuthorContact, Parameters, WorkItem};

    /// 生成 `count` 个论文条目，identifier 为 `paper-{i}`
    pub fn papers(count: usize) -> Vec<WorkItem> {
        (0..count)
            .map(|i| {
                WorkItem::new(
                    i,
                    format!("paper-{i}"),
                    Parameters::new().with("label", format!("Paper {i}")),
                )
            })
            .collect()
    }

    pub fn author(name: &str, nationality: &str, link: &str) -> AuthorContact {
        AuthorContact {
            name: name.into(),
            nationality: nationality.into(),
            linkedin: "Not found".into(),
            email: "Not found".into(),
            paper_link: link.into(),
            notes: String::new(),
        }
    }

    pub const AUTHOR_HEADER: &str = "Name,Nationality,LinkedIn,Email,Link to Paper,Notes";
}

#[cfg(test)]
mod engine_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use batch_engine::{BatchOrchestrator, ChannelObserver, ProgressKind, ProgressUpdate};
    use contracts::{AuthorContact, RouteRule, WorkItem};
    use dispatcher::{MemoryBuffer, RuleClassifier, SinkBackend, SinkWriter};
    use lookup::ScriptedLookup;

    use crate::support::{author, papers, AUTHOR_HEADER};

    fn one_author(item: &WorkItem) -> Vec<AuthorContact> {
        vec![author(&format!("Author {}", item.index), "Canadian", &item.identifier)]
    }

    fn memory_writer(buffer: &MemoryBuffer) -> Arc<SinkWriter<AuthorContact>> {
        Arc::new(
            SinkWriter::builder()
                .register("all", SinkBackend::Memory(buffer.clone()))
                .build()
                .unwrap(),
        )
    }

    /// 5 个条目、并发 2、第 4 个条目失败：其余 4 个照常完成
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_five_items_one_failure() {
        let buffer = MemoryBuffer::new();
        let lookup = ScriptedLookup::new(one_author)
            .default_delay(Duration::from_millis(20))
            .delay("paper-0", Duration::from_millis(60))
            .fail("paper-3", "HTTP 500");
        let probe = lookup.probe();

        let orchestrator = BatchOrchestrator::builder(
            lookup,
            RuleClassifier::new().route("all", RouteRule::All),
            memory_writer(&buffer),
        )
        .concurrency(2)
        .build()
        .unwrap();

        let result = orchestrator.run(papers(5)).await.unwrap();

        assert_eq!(result.len(), 5);
        let indices: Vec<_> = result.outcomes().iter().map(|o| o.item.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(result.succeeded(), 4);
        assert_eq!(result.failed(), 1);

        let failed: Vec<_> = result.failures().collect();
        assert_eq!(failed[0].item.index, 3);
        assert!(failed[0].records.is_empty());
        assert!(failed[0].failure.as_deref().unwrap().contains("HTTP 500"));

        assert!(probe.high_water() <= 2);
        assert_eq!(probe.entered(), 5);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], AUTHOR_HEADER);
        assert!(!lines.iter().any(|l| l.contains("paper-3")));
    }

    /// 延迟顺序与输入顺序相反时，结果仍按输入顺序排列
    #[tokio::test]
    async fn test_order_survives_reversed_latency() {
        let buffer = MemoryBuffer::new();
        let mut lookup = ScriptedLookup::new(one_author);
        for i in 0..6 {
            lookup = lookup.delay(format!("paper-{i}"), Duration::from_millis(60 - i as u64 * 10));
        }

        let orchestrator = BatchOrchestrator::builder(
            lookup,
            RuleClassifier::new().route("all", RouteRule::All),
            memory_writer(&buffer),
        )
        .concurrency(6)
        .build()
        .unwrap();

        let result = orchestrator.run(papers(6)).await.unwrap();
        let links: Vec<_> = result.records().map(|r| r.paper_link.as_str()).collect();
        assert_eq!(
            links,
            vec!["paper-0", "paper-1", "paper-2", "paper-3", "paper-4", "paper-5"]
        );

        // 文件中的行按完成顺序追加
        let lines = buffer.lines();
        assert!(lines[1].contains("paper-5"));
    }

    /// 每个条目的事件都遵循 Pending -> Processing -> 终态
    #[tokio::test]
    async fn test_every_item_reaches_terminal_state() {
        let buffer = MemoryBuffer::new();
        let (observer, mut rx) = ChannelObserver::new();
        let orchestrator = BatchOrchestrator::builder(
            ScriptedLookup::new(one_author).fail("paper-1", "decode error"),
            RuleClassifier::new().route("all", RouteRule::All),
            memory_writer(&buffer),
        )
        .concurrency(2)
        .observer(Arc::new(observer))
        .build()
        .unwrap();

        orchestrator.run(papers(4)).await.unwrap();
        drop(orchestrator);

        let mut history: Vec<Vec<ProgressKind>> = vec![Vec::new(); 4];
        let mut finished = false;
        while let Some(update) = rx.recv().await {
            match update {
                ProgressUpdate::Item(event) => history[event.index].push(event.kind),
                ProgressUpdate::Finished { summary, .. } => {
                    assert_eq!(summary.failed, 1);
                    finished = true;
                }
                ProgressUpdate::Started { total, .. } => assert_eq!(total, 4),
            }
        }
        assert!(finished);

        for (index, kinds) in history.iter().enumerate() {
            assert_eq!(kinds.len(), 3, "item {index}: {kinds:?}");
            assert_eq!(kinds[0], ProgressKind::Pending);
            assert_eq!(kinds[1], ProgressKind::Processing);
            assert!(kinds[2].status().is_terminal());
        }
        assert!(matches!(history[1][2], ProgressKind::Failed { .. }));
    }
}

#[cfg(test)]
mod sink_tests {
    use std::sync::Arc;

    use batch_engine::BatchOrchestrator;
    use contracts::{AuthorContact, RouteRule, SinkConfig, WorkItem};
    use dispatcher::{RuleClassifier, SinkBackend, SinkWriter};
    use lookup::ScriptedLookup;
    use tempfile::tempdir;

    use crate::support::{author, papers, AUTHOR_HEADER};

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// 3 个条目各 2 条记录，条目 1 和 3 同时进入子集文件
    #[tokio::test]
    async fn test_primary_and_subset_files() {
        let dir = tempdir().unwrap();
        let sinks = vec![
            SinkConfig::file("all_authors", dir.path().join("all.csv"), RouteRule::All),
            SinkConfig::file(
                "european_authors",
                dir.path().join("europe.csv"),
                RouteRule::European {
                    field: "Nationality".into(),
                },
            ),
        ];
        let writer = Arc::new(SinkWriter::<AuthorContact>::from_configs(&sinks).unwrap());

        let lookup = ScriptedLookup::new(|item: &WorkItem| {
            let nationality = if item.index == 1 { "American" } else { "Irish" };
            vec![
                author("First", nationality, &item.identifier),
                author("Second", nationality, &item.identifier),
            ]
        });
        let orchestrator =
            BatchOrchestrator::builder(lookup, RuleClassifier::from_configs(&sinks), writer)
                .concurrency(2)
                .build()
                .unwrap();

        let result = orchestrator.run(papers(3)).await.unwrap();
        assert_eq!(result.succeeded(), 3);
        assert_eq!(result.records_written(), 10);

        let all = read_lines(&dir.path().join("all.csv"));
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], AUTHOR_HEADER);

        let europe = read_lines(&dir.path().join("europe.csv"));
        assert_eq!(europe.len(), 5);
        assert_eq!(europe[0], AUTHOR_HEADER);
        assert!(europe[1..].iter().all(|l| l.contains("Irish")));
    }

    /// 多个任务并发追加到同一目标：N×K 行 + 1 行表头，且每行完整
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contended_target_keeps_rows_whole() {
        const TASKS: usize = 20;
        const PER_TASK: usize = 5;

        let dir = tempdir().unwrap();
        let path = dir.path().join("contended.csv");
        let writer = Arc::new(
            SinkWriter::<AuthorContact>::builder()
                .register("all", SinkBackend::File { path: path.clone() })
                .build()
                .unwrap(),
        );

        let mut handles = Vec::new();
        for task in 0..TASKS {
            let writer = Arc::clone(&writer);
            handles.push(tokio::spawn(async move {
                let batch: Vec<_> = (0..PER_TASK)
                    .map(|i| author(&format!("Doe, \"J{task}\" {i}"), "Dutch", "https://p"))
                    .collect();
                writer.append("all", &batch).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), PER_TASK);
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(AUTHOR_HEADER).count(), 1);

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), TASKS * PER_TASK);
        assert!(rows.iter().all(|r| r.len() == 6));

        // 同一批次的行保持连续
        for chunk in rows.chunks(PER_TASK) {
            let task: String = chunk[0][0].split(' ').nth(1).unwrap().to_string();
            assert!(chunk.iter().all(|r| r[0].contains(&task)));
        }
    }

    /// 两个目标交替并发写入：各自一行表头、互不串行
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_targets_are_independent() {
        let dir = tempdir().unwrap();
        let writer = Arc::new(
            SinkWriter::<AuthorContact>::builder()
                .register("left", SinkBackend::File { path: dir.path().join("left.csv") })
                .register("right", SinkBackend::File { path: dir.path().join("right.csv") })
                .build()
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..30 {
            let writer = Arc::clone(&writer);
            let target = if i % 2 == 0 { "left" } else { "right" };
            handles.push(tokio::spawn(async move {
                writer
                    .append(target, &[author(&format!("{target}-{i}"), "Greek", "https://p")])
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for target in ["left", "right"] {
            let lines = read_lines(&dir.path().join(format!("{target}.csv")));
            assert_eq!(lines.len(), 16);
            assert_eq!(lines[0], AUTHOR_HEADER);
            assert!(lines[1..].iter().all(|l| l.starts_with(target)));
            assert_eq!(writer.metrics(target).unwrap().append_count, 15);
        }
    }

    /// 一个目标卡在写入时，另一个目标照常追加
    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stuck_target_does_not_block_others() {
        use std::io::BufRead;
        use std::time::Duration;
        use tokio::time::timeout;

        let dir = tempdir().unwrap();
        // 没有读端时打开 FIFO 会一直阻塞
        let fifo = dir.path().join("left.fifo");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let writer = Arc::new(
            SinkWriter::<AuthorContact>::builder()
                .register("left", SinkBackend::File { path: fifo.clone() })
                .register("right", SinkBackend::File { path: dir.path().join("right.csv") })
                .build()
                .unwrap(),
        );

        let stuck = {
            let writer = Arc::clone(&writer);
            tokio::spawn(async move {
                writer
                    .append("left", &[author("Left", "Greek", "https://p/0")])
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!stuck.is_finished());

        let right = timeout(
            Duration::from_secs(2),
            writer.append("right", &[author("Right", "Greek", "https://p/1")]),
        )
        .await;
        assert_eq!(right.unwrap().unwrap(), 1);

        let second_left = timeout(
            Duration::from_millis(200),
            writer.append("left", &[author("Left again", "Greek", "https://p/2")]),
        )
        .await;
        assert!(second_left.is_err());

        // 打开读端，放行被卡住的追加
        let drained = tokio::task::spawn_blocking(move || {
            let reader = std::io::BufReader::new(std::fs::File::open(&fifo).unwrap());
            reader.lines().take(2).map(Result::unwrap).collect::<Vec<_>>()
        });
        assert_eq!(stuck.await.unwrap().unwrap(), 1);
        let lines = drained.await.unwrap();
        assert_eq!(lines[0], AUTHOR_HEADER);
        assert!(lines[1].starts_with("Left,"));

        assert_eq!(read_lines(&dir.path().join("right.csv")).len(), 2);
    }

    /// 已存在的文件不会再写表头
    #[tokio::test]
    async fn test_existing_file_keeps_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("all.csv");
        std::fs::write(&path, format!("{AUTHOR_HEADER}\nOld,French,,,,\n")).unwrap();

        let sinks = vec![SinkConfig::file("all", &path, RouteRule::All)];
        let writer = Arc::new(SinkWriter::<AuthorContact>::from_configs(&sinks).unwrap());
        let orchestrator = BatchOrchestrator::builder(
            ScriptedLookup::new(|item: &WorkItem| vec![author("New", "Swiss", &item.identifier)]),
            RuleClassifier::from_configs(&sinks),
            writer,
        )
        .build()
        .unwrap();

        orchestrator.run(papers(2)).await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.iter().filter(|l| *l == AUTHOR_HEADER).count(), 1);
        assert_eq!(lines[1], "Old,French,,,,");
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use batch_engine::BatchOrchestrator;
    use config_loader::ConfigLoader;
    use contracts::{NutrientRecord, Profile, WorkItem};
    use dispatcher::{RuleClassifier, SinkWriter};
    use lookup::ScriptedLookup;
    use tempfile::tempdir;

    /// 配置文件 -> 读取输入 -> 批处理 -> 写出 CSV
    #[tokio::test]
    async fn test_nutrition_job_from_config() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ingredients.csv");
        std::fs::write(
            &input,
            "Food,1 serving (g)\nSpinach,30\nBroken,abc\nRice,150\nSalmon,100\n",
        )
        .unwrap();
        let output_dir = dir.path().join("out");

        let config_path = dir.path().join("job.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
[job]
profile = "nutrition"
input = {input:?}
output_dir = {output_dir:?}
concurrency = 2

[[sinks]]
name = "nutrients"
sink_type = "file"
path = "facts.csv"

[[sinks]]
name = "minerals"
sink_type = "file"
path = "minerals.csv"
route = {{ kind = "any_of", field = "Unit", values = ["mg"] }}
"#
            ),
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(&config_path).unwrap();
        assert_eq!(blueprint.job.profile, Profile::Nutrition);

        let items = ingestion::load_items(blueprint.job.profile, &blueprint.job.input, None).unwrap();
        let labels: Vec<_> = items.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(labels, vec!["Spinach", "Rice", "Salmon"]);

        let sinks = blueprint.resolved_sinks();
        let writer = Arc::new(SinkWriter::<NutrientRecord>::from_configs(&sinks).unwrap());
        let lookup = ScriptedLookup::new(|item: &WorkItem| {
            let serving_g = item
                .parameters
                .get(lookup::SERVING_PARAM)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            vec![
                NutrientRecord {
                    ingredient: item.identifier.clone(),
                    serving_g,
                    calories: Some(10.0),
                    nutrient: "Iron".into(),
                    amount: 1.8,
                    unit: "mg".into(),
                    percent_rda: lookup::rda_percentage("Iron", 1.8, "mg"),
                },
                NutrientRecord {
                    ingredient: item.identifier.clone(),
                    serving_g,
                    calories: Some(10.0),
                    nutrient: "Folate".into(),
                    amount: 40.0,
                    unit: "mcg".into(),
                    percent_rda: lookup::rda_percentage("Folate", 40.0, "mcg"),
                },
            ]
        })
        .fail("Salmon", "model returned no JSON");

        let orchestrator =
            BatchOrchestrator::builder(lookup, RuleClassifier::from_configs(&sinks), writer)
                .concurrency(blueprint.job.concurrency)
                .build()
                .unwrap();
        let result = orchestrator.run(items).await.unwrap();
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);

        let facts = std::fs::read_to_string(output_dir.join("facts.csv")).unwrap();
        let facts: Vec<_> = facts.lines().collect();
        assert_eq!(facts.len(), 5);
        assert_eq!(facts[0], "Ingredient,Serving (g),Calories,Nutrient,Amount,Unit,% RDA");
        assert!(facts.contains(&"Spinach,30,10,Iron,1.8,mg,10"));

        let minerals = std::fs::read_to_string(output_dir.join("minerals.csv")).unwrap();
        assert_eq!(minerals.lines().count(), 3);
        assert!(!minerals.contains("Folate"));
    }

    /// 配置校验拒绝非法组合
    #[test]
    fn test_invalid_config_is_rejected() {
        let content = r#"
[job]
profile = "papers"
input = "papers.csv"
concurrency = 0
"#;
        let err = ConfigLoader::load_from_str(content, config_loader::ConfigFormat::Toml)
            .unwrap_err()
            .to_string();
        assert!(err.contains("concurrency"), "got: {err}");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, TaskConfig};
    use crate::errors::ResearchError;
    use crate::generator::context::ResearchContext;
    use crate::generator::publisher::*;
    use crate::i18n::TargetLanguage;
    use crate::progress::{MemorySink, ProgressEvent, ProgressReporter};
    use crate::types::{PublishFormat, PublishFormats, ResearchEntry, ResearchState, Tone};
    use crate::utils::CancellationToken;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// 记录调用并可配置失败的渲染器
    struct RecordingRenderer {
        format: PublishFormat,
        fail: bool,
        calls: Arc<Mutex<Vec<PublishFormat>>>,
    }

    #[async_trait]
    impl FormatRenderer for RecordingRenderer {
        fn format(&self) -> PublishFormat {
            self.format
        }

        async fn render(&self, _layout: &str, output_dir: &Path) -> Result<PathBuf> {
            self.calls.lock().unwrap().push(self.format);
            if self.fail {
                return Err(anyhow!("{} renderer is broken", self.format));
            }
            Ok(output_dir.join(format!("report.{}", self.format.extension())))
        }
    }

    fn recording_publisher(
        failing: &[PublishFormat],
    ) -> (Publisher, Arc<Mutex<Vec<PublishFormat>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut publisher = Publisher::new(Some(PathBuf::from("/unused")));
        for format in PublishFormat::ALL {
            publisher = publisher.with_renderer(Arc::new(RecordingRenderer {
                format,
                fail: failing.contains(&format),
                calls: calls.clone(),
            }));
        }
        (publisher, calls)
    }

    fn context_with_sink() -> (ResearchContext, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let ctx = ResearchContext::new(
            Arc::new(Config::default()),
            TaskConfig::with_query("soil"),
            Tone::Objective,
            ProgressReporter::new(sink.clone()),
            CancellationToken::new(),
        );
        (ctx, sink)
    }

    fn task_with_formats(formats: PublishFormats) -> TaskConfig {
        let mut task = TaskConfig::with_query("soil");
        task.publish_formats = formats;
        task
    }

    fn full_state(task: TaskConfig) -> ResearchState {
        let mut state = ResearchState::new(task, Tone::Objective);
        state.set_title("Soil and Yield").unwrap();
        state.set_date("01/02/2025").unwrap();
        state.set_introduction("Intro text").unwrap();
        state.set_table_of_contents("- Biology\n- Chemistry").unwrap();
        state.set_conclusion("Final words").unwrap();
        state.append_research_entry(ResearchEntry::single("Biology", "## Biology\n\nMicrobes."));
        let mut chemistry = ResearchEntry::new();
        chemistry.insert("Chemistry", "## Chemistry\n\nNitrogen.");
        chemistry.insert("Chemistry notes", "Phosphorus.");
        state.append_research_entry(chemistry);
        state.extend_sources(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ]);
        state
            .set_headers(TargetLanguage::English.report_headers("Soil and Yield"))
            .unwrap();
        state
    }

    #[test]
    fn test_layout_matches_template() {
        let state = full_state(TaskConfig::with_query("soil"));
        let layout = generate_layout(&state).unwrap();

        let expected = "# Soil and Yield\n\
                        #### Date: 01/02/2025\n\
                        \n\
                        ## Introduction\n\
                        Intro text\n\
                        \n\
                        ## Table of Contents\n\
                        - Biology\n- Chemistry\n\
                        \n\
                        ## Biology\n\nMicrobes.\n\n## Chemistry\n\nNitrogen.\n\nPhosphorus.\n\
                        \n\
                        ## Conclusion\n\
                        Final words\n\
                        \n\
                        ## References\n\
                        https://a.example\nhttps://b.example\n";
        assert_eq!(layout, expected);
    }

    #[test]
    fn test_layout_keeps_entry_order_without_duplication() {
        let mut state = ResearchState::new(TaskConfig::with_query("q"), Tone::Objective);
        for i in 0..5 {
            state.append_research_entry(ResearchEntry::single(
                format!("s{}", i),
                format!("SECTION-{}", i),
            ));
        }
        state
            .set_headers(TargetLanguage::English.report_headers("T"))
            .unwrap();
        let layout = generate_layout(&state).unwrap();

        let positions: Vec<usize> = (0..5)
            .map(|i| layout.find(&format!("SECTION-{}", i)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for i in 0..5 {
            assert_eq!(layout.matches(&format!("SECTION-{}", i)).count(), 1);
        }
        assert!(layout.contains("SECTION-0\n\nSECTION-1\n\nSECTION-2"));
    }

    #[test]
    fn test_layout_is_idempotent() {
        let state = full_state(TaskConfig::with_query("soil"));
        assert_eq!(
            generate_layout(&state).unwrap(),
            generate_layout(&state).unwrap()
        );
    }

    #[test]
    fn test_missing_optional_fields_degrade_to_empty() {
        let mut state = ResearchState::new(TaskConfig::with_query("q"), Tone::Objective);
        state
            .set_headers(TargetLanguage::English.report_headers("T"))
            .unwrap();
        let layout = generate_layout(&state).unwrap();

        assert!(layout.starts_with("# T\n#### Date: \n"));
        assert!(layout.ends_with("## References\n\n"));
    }

    #[test]
    fn test_missing_headers_is_malformed_state() {
        let state = ResearchState::new(TaskConfig::with_query("q"), Tone::Objective);
        assert!(matches!(
            generate_layout(&state),
            Err(ResearchError::MalformedState(_))
        ));
    }

    #[tokio::test]
    async fn test_only_enabled_formats_are_exported() {
        let (publisher, calls) = recording_publisher(&[]);
        let (ctx, _) = context_with_sink();
        let state = full_state(task_with_formats(PublishFormats::markdown_only()));
        let dir = TempDir::new().unwrap();

        let outcome = publisher
            .publish_research_report(&ctx, &state, Some(dir.path()))
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![PublishFormat::Markdown]);
        assert_eq!(outcome.metadata.formats, vec!["markdown"]);
        assert_eq!(outcome.metadata.files, vec![dir.path().join("report.md")]);
        assert_eq!(outcome.report.format, "markdown");
        assert_eq!(outcome.report.metadata.title, "Soil and Yield");
        assert_eq!(outcome.report.metadata.date, "01/02/2025");
    }

    #[tokio::test]
    async fn test_export_failures_are_isolated_and_aggregated() {
        let (publisher, calls) = recording_publisher(&[PublishFormat::Pdf]);
        let (ctx, _) = context_with_sink();
        let formats = PublishFormats {
            markdown: true,
            pdf: true,
            docx: true,
        };
        let dir = TempDir::new().unwrap();

        let err = publisher
            .write_report_by_formats(&ctx, "# x\n", &formats, dir.path())
            .await
            .unwrap_err();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                PublishFormat::Pdf,
                PublishFormat::Docx,
                PublishFormat::Markdown
            ]
        );
        match err {
            ResearchError::Export { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].format, PublishFormat::Pdf);
                assert!(failures[0].message.contains("pdf renderer is broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_output_dir_skips_export() {
        let (publisher, calls) = recording_publisher(&[]);
        let (ctx, _) = context_with_sink();
        let state = full_state(TaskConfig::with_query("soil"));

        let outcome = publisher
            .publish_research_report(&ctx, &state, None)
            .await
            .unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert!(outcome.metadata.files.is_empty());
        assert_eq!(outcome.metadata.formats, vec!["markdown"]);
    }

    #[tokio::test]
    async fn test_run_reports_status_before_and_after() {
        let (publisher, _) = recording_publisher(&[]);
        let (ctx, sink) = context_with_sink();
        let state = full_state(TaskConfig::with_query("soil"));
        let dir = TempDir::new().unwrap();

        publisher.run(&ctx, &state, Some(dir.path())).await.unwrap();

        let progress: Vec<u8> = sink
            .events()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Status { key, progress, .. } if key == "publishing" => {
                    Some(*progress)
                }
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 100]);
    }

    #[tokio::test]
    async fn test_run_emits_error_event_and_reraises() {
        let (publisher, _) = recording_publisher(&[PublishFormat::Markdown]);
        let (ctx, sink) = context_with_sink();
        let state = full_state(TaskConfig::with_query("soil"));
        let dir = TempDir::new().unwrap();

        let err = publisher
            .run(&ctx, &state, Some(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, ResearchError::Export { .. }));
        let events = sink.events();
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Error { key, message })
                if key == "error" && message.starts_with("Error publishing report:")
        ));
        assert!(!events.iter().any(|event| matches!(
            event,
            ProgressEvent::Status { progress: 100, .. }
        )));
    }

    #[tokio::test]
    async fn test_markdown_renderer_end_to_end() {
        let dir = TempDir::new().unwrap();
        let publisher = Publisher::from_config(&crate::config::PublisherConfig {
            output_path: Some(dir.path().to_path_buf()),
            pandoc_path: PathBuf::from("pandoc"),
        });
        let (ctx, _) = context_with_sink();
        let state = full_state(TaskConfig::with_query("soil"));
        let out = dir.path().join("run_1_soil");

        let outcome = publisher
            .publish_research_report(&ctx, &state, Some(&out))
            .await
            .unwrap();

        let written = std::fs::read_to_string(out.join("report.md")).unwrap();
        assert_eq!(written, outcome.report.content);
        assert_eq!(publisher.output_root(), Some(dir.path()));
    }
}

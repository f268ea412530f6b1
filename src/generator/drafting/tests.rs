#[cfg(test)]
mod tests {
    use crate::config::{Config, FailurePolicy, TaskConfig};
    use crate::errors::ResearchError;
    use crate::generator::context::ResearchContext;
    use crate::generator::drafting::*;
    use crate::progress::ProgressReporter;
    use crate::types::{ResearchEntry, ResearchState, Tone};
    use crate::utils::CancellationToken;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedWriter {
        delays_ms: HashMap<String, u64>,
        failing: Vec<String>,
        started: AtomicUsize,
    }

    impl ScriptedWriter {
        fn delay(mut self, topic: &str, ms: u64) -> Self {
            self.delays_ms.insert(topic.to_string(), ms);
            self
        }

        fn fail_on(mut self, topic: &str) -> Self {
            self.failing.push(topic.to_string());
            self
        }
    }

    #[async_trait]
    impl SectionWriter for ScriptedWriter {
        async fn write_section(
            &self,
            _context: &ResearchContext,
            brief: SectionBrief,
        ) -> Result<ResearchEntry> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delays_ms.get(&brief.topic) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.failing.contains(&brief.topic) {
                bail!("writer crashed on {}", brief.topic);
            }
            Ok(ResearchEntry::single(
                brief.topic.clone(),
                format!("## {}\n\nBody of {}.", brief.topic, brief.topic),
            ))
        }
    }

    struct FixedReportWriter;

    #[async_trait]
    impl ReportWriter for FixedReportWriter {
        async fn write_report(
            &self,
            _context: &ResearchContext,
            state: &ResearchState,
        ) -> Result<ReportFrame> {
            Ok(ReportFrame {
                introduction: "Intro".to_string(),
                table_of_contents: table_of_contents(state.research_data()),
                conclusion: "Done".to_string(),
            })
        }
    }

    fn context(max_parallels: usize, policy: FailurePolicy) -> ResearchContext {
        let mut config = Config::default();
        config.cache.enabled = false;
        config.drafting.max_parallels = max_parallels;
        config.drafting.failure_policy = policy;
        ResearchContext::new(
            Arc::new(config),
            TaskConfig::with_query("soil"),
            Tone::Objective,
            ProgressReporter::default(),
            CancellationToken::new(),
        )
    }

    fn planned_state(sections: &[&str]) -> ResearchState {
        let mut state = ResearchState::new(TaskConfig::with_query("soil"), Tone::Objective);
        state.set_title("Soil report").unwrap();
        state
            .set_sections(sections.iter().map(|s| s.to_string()).collect())
            .unwrap();
        state
    }

    fn desk(writer: ScriptedWriter) -> (EditorialDesk, Arc<ScriptedWriter>) {
        let writer = Arc::new(writer);
        (
            EditorialDesk::new(writer.clone(), Arc::new(FixedReportWriter)),
            writer,
        )
    }

    fn drafted_topics(state: &ResearchState) -> Vec<String> {
        state
            .research_data()
            .iter()
            .flat_map(|entry| entry.keys().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    #[tokio::test]
    async fn test_entries_are_merged_in_arrival_order() {
        let (desk, _) = desk(
            ScriptedWriter::default()
                .delay("a", 150)
                .delay("b", 10)
                .delay("c", 70),
        );
        let ctx = context(3, FailurePolicy::FailFast);
        let mut state = planned_state(&["a", "b", "c"]);

        desk.draft(&ctx, &mut state).await.unwrap();

        assert_eq!(drafted_topics(&state), vec!["b", "c", "a"]);
        assert_eq!(state.introduction(), "Intro");
        assert_eq!(state.conclusion(), "Done");
        assert_eq!(state.table_of_contents(), "- b\n- c\n- a");
        assert_eq!(state.headers().unwrap().title, "Soil report");
    }

    #[tokio::test]
    async fn test_fail_fast_keeps_siblings_that_already_succeeded() {
        let (desk, writer) = desk(ScriptedWriter::default().fail_on("c"));
        let ctx = context(1, FailurePolicy::FailFast);
        let mut state = planned_state(&["a", "b", "c", "d"]);

        let err = desk.draft(&ctx, &mut state).await.unwrap_err();

        assert!(format!("{:#}", err).contains("writer crashed on c"));
        assert_eq!(drafted_topics(&state), vec!["a", "b"]);
        assert_eq!(writer.started.load(Ordering::SeqCst), 3);
        assert!(state.headers().is_none());
    }

    #[tokio::test]
    async fn test_collect_partial_merges_every_success_before_failing() {
        let (desk, writer) = desk(ScriptedWriter::default().fail_on("b"));
        let ctx = context(1, FailurePolicy::CollectPartial);
        let mut state = planned_state(&["a", "b", "c", "d"]);

        let err = desk.draft(&ctx, &mut state).await.unwrap_err();

        assert!(format!("{:#}", err).contains("failed to draft section `b`"));
        assert_eq!(drafted_topics(&state), vec!["a", "c", "d"]);
        assert_eq!(writer.started.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_no_sections_still_frames_the_report() {
        let (desk, _) = desk(ScriptedWriter::default());
        let ctx = context(3, FailurePolicy::FailFast);
        let mut state = planned_state(&[]);

        desk.draft(&ctx, &mut state).await.unwrap();

        assert!(state.research_data().is_empty());
        assert_eq!(state.table_of_contents(), "");
        assert!(state.headers().is_some());
    }

    #[tokio::test]
    async fn test_cancellation_abandons_in_flight_sections() {
        let (desk, _) = desk(ScriptedWriter::default().delay("a", 10_000));
        let ctx = context(2, FailurePolicy::FailFast);
        let mut state = planned_state(&["a"]);

        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(2), desk.draft(&ctx, &mut state))
            .await
            .expect("cancellation should be prompt")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResearchError>(),
            Some(ResearchError::Cancelled)
        ));
        assert!(state.research_data().is_empty());
    }

    #[test]
    fn test_table_of_contents_lists_section_keys() {
        let data = vec![
            ResearchEntry::single("One", "x"),
            ResearchEntry::single("Two", "y"),
        ];
        assert_eq!(table_of_contents(&data), "- One\n- Two");
        assert_eq!(table_of_contents(&[]), "");
    }
}

//! 起草阶段：按大纲并发撰写各章节，再补齐引言、目录与结论

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::FailurePolicy;
use crate::generator::context::ResearchContext;
use crate::types::{ResearchEntry, ResearchState};

mod agents;

pub use agents::{
    LlmReportWriter, LlmSectionWriter, ReportComposer, ReviewVerdict, SectionResearcher,
    SectionReviewer, SectionReviser,
};

/// 章节写作所需的简报
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBrief {
    pub report_title: String,
    pub topic: String,
    pub initial_research: String,
}

/// 报告的外围部分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFrame {
    pub introduction: String,
    pub table_of_contents: String,
    pub conclusion: String,
}

/// 起草阶段契约：把规划结果扩展为章节内容
#[async_trait]
pub trait DraftingStage: Send + Sync {
    async fn draft(&self, context: &ResearchContext, state: &mut ResearchState) -> Result<()>;
}

/// 单个章节的写作者
#[async_trait]
pub trait SectionWriter: Send + Sync {
    async fn write_section(
        &self,
        context: &ResearchContext,
        brief: SectionBrief,
    ) -> Result<ResearchEntry>;
}

/// 引言、目录与结论的写作者
#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write_report(
        &self,
        context: &ResearchContext,
        state: &ResearchState,
    ) -> Result<ReportFrame>;
}

/// 编辑部：章节写作的扇出/扇入
///
/// 并发度受 `drafting.max_parallels` 约束；结果按完成先后整条追加到 `research_data`。
pub struct EditorialDesk {
    section_writer: Arc<dyn SectionWriter>,
    report_writer: Arc<dyn ReportWriter>,
}

impl EditorialDesk {
    pub fn new(section_writer: Arc<dyn SectionWriter>, report_writer: Arc<dyn ReportWriter>) -> Self {
        Self {
            section_writer,
            report_writer,
        }
    }

    /// 扇出写作所有章节，成功的结果在任何失败被抛出之前合并进状态
    async fn write_sections(
        &self,
        context: &ResearchContext,
        state: &mut ResearchState,
    ) -> Result<()> {
        let briefs: Vec<SectionBrief> = state
            .sections()
            .iter()
            .map(|topic| SectionBrief {
                report_title: state.title().to_string(),
                topic: topic.clone(),
                initial_research: state.initial_research().to_string(),
            })
            .collect();
        let total = briefs.len();
        let max_parallels = context.config.drafting.max_parallels.max(1);
        let policy = context.config.drafting.failure_policy;

        tracing::info!(
            "🚀 启动章节并发写作，共 {} 个章节，最大并发数：{}",
            total,
            max_parallels
        );

        let pending = futures::stream::iter(briefs.into_iter().map(|brief| {
            let writer = self.section_writer.clone();
            async move {
                let topic = brief.topic.clone();
                let result = writer.write_section(context, brief).await;
                (topic, result)
            }
        }))
        .buffer_unordered(max_parallels);
        let mut pending = std::pin::pin!(pending);

        let mut first_failure: Option<anyhow::Error> = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = context.cancel.cancelled() => {
                    return Err(crate::errors::ResearchError::Cancelled.into());
                }
                next = pending.next() => next,
            };
            let Some((topic, result)) = next else {
                break;
            };

            match result {
                Ok(entry) => {
                    state.append_research_entry(entry);
                    context
                        .reporter
                        .log(
                            "section_drafted",
                            format!(
                                "Drafted section '{}' ({}/{})",
                                topic,
                                state.research_data().len(),
                                total
                            ),
                        )
                        .await;
                }
                Err(e) => {
                    tracing::warn!("❌ 章节 `{}` 写作失败: {:#}", topic, e);
                    if first_failure.is_none() {
                        first_failure =
                            Some(e.context(format!("failed to draft section `{}`", topic)));
                    }
                    if policy == FailurePolicy::FailFast {
                        break;
                    }
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DraftingStage for EditorialDesk {
    async fn draft(&self, context: &ResearchContext, state: &mut ResearchState) -> Result<()> {
        self.write_sections(context, state).await?;

        let frame = context
            .cancel
            .run_until_cancelled(self.report_writer.write_report(context, state))
            .await?
            .context("failed to write introduction and conclusion")?;

        state.set_introduction(frame.introduction)?;
        state.set_table_of_contents(frame.table_of_contents)?;
        state.set_conclusion(frame.conclusion)?;
        state.set_headers(context.config.target_language.report_headers(state.title()))?;

        tracing::info!("✅ 起草完成，共 {} 个章节", state.research_data().len());
        Ok(())
    }
}

/// 由章节标题生成目录
pub fn table_of_contents(research_data: &[ResearchEntry]) -> String {
    research_data
        .iter()
        .flat_map(|entry| entry.keys())
        .map(|topic| format!("- {}", topic))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests;

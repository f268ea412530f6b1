//! 规划阶段：根据查询产出报告标题、章节大纲与参考来源，不写正文

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::TaskConfig;
use crate::generator::context::ResearchContext;
use crate::generator::step_forward_agent::StepForwardAgent;
use crate::llm::LLMClient;

mod agents;

pub use agents::{InitialResearcher, OutlineEditor, ResearchOutline};

/// 报告日期格式 dd/mm/YYYY
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// 规划结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub title: String,
    pub date: String,
    /// 初步调研的自由文本，供起草阶段参考
    pub initial_research: String,
    pub sections: Vec<String>,
    pub sources: Vec<String>,
}

impl ResearchPlan {
    /// 按任务约束整理规划结果
    ///
    /// 章节裁剪到 `max_sections`；用户指定的来源排在最前，去重时保留首次出现，
    /// 最后裁剪到 `max_sources`。
    pub fn conform_to(mut self, task: &TaskConfig) -> Self {
        self.sections.retain(|section| !section.trim().is_empty());
        self.sections.truncate(task.max_sections);

        let mut seen = HashSet::new();
        let mut sources: Vec<String> = task
            .source_urls
            .iter()
            .chain(self.sources.iter())
            .map(|source| source.trim().to_string())
            .filter(|source| !source.is_empty() && seen.insert(source.clone()))
            .collect();
        if let Some(max_sources) = task.max_sources {
            sources.truncate(max_sources);
        }
        self.sources = sources;
        self
    }
}

/// 规划阶段契约
#[async_trait]
pub trait PlanningStage: Send + Sync {
    /// 零来源不是错误，返回空序列即可
    async fn plan(&self, context: &ResearchContext) -> Result<ResearchPlan>;
}

/// 基于模型的规划：先初步调研，再由大纲编辑整理出结构
pub struct LlmPlanner {
    llm: LLMClient,
}

impl LlmPlanner {
    pub fn new(llm: LLMClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl PlanningStage for LlmPlanner {
    async fn plan(&self, context: &ResearchContext) -> Result<ResearchPlan> {
        tracing::info!("🔎 正在规划研究: {}", context.query());

        let initial_research = InitialResearcher.execute(context, &self.llm).await?;
        context
            .reporter
            .log(
                "initial_research",
                format!("Initial research finished for '{}'", context.query()),
            )
            .await;

        let outline = OutlineEditor::new(initial_research.clone())
            .execute(context, &self.llm)
            .await?;
        context
            .reporter
            .log(
                "planner",
                format!(
                    "Planned {} sections with {} sources",
                    outline.sections.len(),
                    outline.sources.len()
                ),
            )
            .await;

        let title = if outline.title.trim().is_empty() {
            context.query().to_string()
        } else {
            outline.title.trim().to_string()
        };

        Ok(ResearchPlan {
            title,
            date: chrono::Local::now().format(REPORT_DATE_FORMAT).to_string(),
            initial_research,
            sections: outline.sections,
            sources: outline.sources,
        })
    }
}

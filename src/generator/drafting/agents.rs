use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ReportFrame, ReportWriter, SectionBrief, SectionWriter, table_of_contents};
use crate::generator::context::ResearchContext;
use crate::generator::step_forward_agent::{
    LLMCallMode, Material, PromptTemplate, StepForwardAgent,
};
use crate::generator::types::AgentType;
use crate::llm::LLMClient;
use crate::types::{ResearchEntry, ResearchState};

/// 章节调研员：为一个章节主题写出完整的正文
pub struct SectionResearcher {
    brief: SectionBrief,
}

impl SectionResearcher {
    pub fn new(brief: SectionBrief) -> Self {
        Self { brief }
    }
}

impl StepForwardAgent for SectionResearcher {
    type Output = String;

    fn agent_type(&self) -> AgentType {
        AgentType::SectionResearcher
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a senior researcher writing one section of a larger research report.
Stay strictly within the topic of your section; other sections are written by your colleagues.
Support every claim with facts and cite sources inline as markdown links."#
                .to_string(),
            opening_instruction: format!(
                "Write the section \"{}\" of the report \"{}\".",
                self.brief.topic, self.brief.report_title
            ),
            closing_instruction: format!(
                "Start with the heading `## {}` and write the section body in markdown. Do not add an introduction or a conclusion for the whole report.",
                self.brief.topic
            ),
            llm_call_mode: LLMCallMode::Prompt,
        }
    }

    fn research_material(&self, _context: &ResearchContext) -> Vec<Material> {
        vec![(
            "Initial research".to_string(),
            self.brief.initial_research.clone(),
        )]
    }

    fn post_process(&self, result: Self::Output, _context: &ResearchContext) -> Result<Self::Output> {
        Ok(with_section_heading(&self.brief.topic, &result))
    }
}

/// 确保章节以二级标题开头
fn with_section_heading(topic: &str, text: &str) -> String {
    let text = text.trim();
    if text.starts_with('#') {
        text.to_string()
    } else {
        format!("## {}\n\n{}", topic, text)
    }
}

/// 审阅结论
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReviewVerdict {
    /// 章节已符合全部写作准则
    pub accepted: bool,
    /// 未通过时给修订者的具体意见
    pub notes: String,
}

/// 章节审阅者：对照写作准则检查草稿
pub struct SectionReviewer {
    topic: String,
    draft: String,
}

impl SectionReviewer {
    pub fn new(topic: String, draft: String) -> Self {
        Self { topic, draft }
    }
}

impl StepForwardAgent for SectionReviewer {
    type Output = ReviewVerdict;

    fn agent_type(&self) -> AgentType {
        AgentType::SectionReviewer
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an exacting reviewer. You check research drafts against the editorial guidelines and nothing else.".to_string(),
            opening_instruction: format!("Review the draft of the section \"{}\".", self.topic),
            closing_instruction: "Accept the draft only if it follows every guideline. Otherwise list concrete, actionable revision notes.".to_string(),
            llm_call_mode: LLMCallMode::Extract,
        }
    }

    fn research_material(&self, _context: &ResearchContext) -> Vec<Material> {
        vec![("Draft".to_string(), self.draft.clone())]
    }
}

/// 章节修订者：按审阅意见改写草稿
pub struct SectionReviser {
    topic: String,
    draft: String,
    notes: String,
}

impl SectionReviser {
    pub fn new(topic: String, draft: String, notes: String) -> Self {
        Self {
            topic,
            draft,
            notes,
        }
    }
}

impl StepForwardAgent for SectionReviser {
    type Output = String;

    fn agent_type(&self) -> AgentType {
        AgentType::SectionReviser
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an expert editor revising a section of a research report according to reviewer notes.".to_string(),
            opening_instruction: format!("Revise the section \"{}\".", self.topic),
            closing_instruction: format!(
                "Return the full revised section in markdown, starting with the heading `## {}`.",
                self.topic
            ),
            llm_call_mode: LLMCallMode::Prompt,
        }
    }

    fn research_material(&self, _context: &ResearchContext) -> Vec<Material> {
        vec![
            ("Draft".to_string(), self.draft.clone()),
            ("Reviewer notes".to_string(), self.notes.clone()),
        ]
    }

    fn post_process(&self, result: Self::Output, _context: &ResearchContext) -> Result<Self::Output> {
        Ok(with_section_heading(&self.topic, &result))
    }
}

/// 引言与结论
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReportBookends {
    /// 报告引言，markdown，不含标题
    pub introduction: String,
    /// 报告结论，markdown，不含标题
    pub conclusion: String,
}

/// 报告撰稿人：基于全部章节写引言与结论
pub struct ReportComposer {
    title: String,
    sections: String,
}

impl ReportComposer {
    pub fn new(state: &ResearchState) -> Self {
        let sections = state
            .research_data()
            .iter()
            .flat_map(|entry| entry.values())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            title: state.title().to_string(),
            sections,
        }
    }
}

impl StepForwardAgent for ReportComposer {
    type Output = ReportBookends;

    fn agent_type(&self) -> AgentType {
        AgentType::ReportWriter
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a research writer. You frame a finished research report with an introduction and a conclusion.".to_string(),
            opening_instruction: format!(
                "Write the introduction and the conclusion of the report \"{}\".",
                self.title
            ),
            closing_instruction: "The introduction motivates the question and previews the sections. The conclusion synthesises the findings. Do not include headings.".to_string(),
            llm_call_mode: LLMCallMode::Extract,
        }
    }

    fn research_material(&self, _context: &ResearchContext) -> Vec<Material> {
        vec![("Report sections".to_string(), self.sections.clone())]
    }
}

/// 模型驱动的章节写作：调研、（按准则）审阅与修订
pub struct LlmSectionWriter {
    llm: LLMClient,
}

impl LlmSectionWriter {
    pub fn new(llm: LLMClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SectionWriter for LlmSectionWriter {
    async fn write_section(
        &self,
        context: &ResearchContext,
        brief: SectionBrief,
    ) -> Result<ResearchEntry> {
        let topic = brief.topic.clone();
        let mut draft = SectionResearcher::new(brief)
            .execute(context, &self.llm)
            .await?;

        if !context.task.active_guidelines().is_empty() {
            let max_revisions = context.config.drafting.max_revisions;
            for round in 1..=max_revisions {
                let verdict = SectionReviewer::new(topic.clone(), draft.clone())
                    .execute(context, &self.llm)
                    .await?;
                if verdict.accepted {
                    break;
                }
                tracing::debug!("✏️ 章节 `{}` 第 {} 轮修订", topic, round);
                draft = SectionReviser::new(topic.clone(), draft, verdict.notes)
                    .execute(context, &self.llm)
                    .await?;
            }
        }

        Ok(ResearchEntry::single(topic, draft))
    }
}

/// 模型驱动的引言与结论写作，目录由章节标题生成
pub struct LlmReportWriter {
    llm: LLMClient,
}

impl LlmReportWriter {
    pub fn new(llm: LLMClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportWriter for LlmReportWriter {
    async fn write_report(
        &self,
        context: &ResearchContext,
        state: &ResearchState,
    ) -> Result<ReportFrame> {
        let bookends = ReportComposer::new(state)
            .execute(context, &self.llm)
            .await?;
        Ok(ReportFrame {
            introduction: bookends.introduction,
            table_of_contents: table_of_contents(state.research_data()),
            conclusion: bookends.conclusion,
        })
    }
}

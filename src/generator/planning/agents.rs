use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::context::ResearchContext;
use crate::generator::step_forward_agent::{
    LLMCallMode, Material, PromptTemplate, StepForwardAgent,
};
use crate::generator::types::AgentType;

/// 初步调研：对查询做一次概览式的调研
#[derive(Default)]
pub struct InitialResearcher;

impl StepForwardAgent for InitialResearcher {
    type Output = String;

    fn agent_type(&self) -> AgentType {
        AgentType::InitialResearcher
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a meticulous research analyst. Your job is to survey a research question before any report is written.
Identify the key themes, open debates, important facts and the most authoritative sources on the topic.
Cite every source you rely on with its full URL or a precise bibliographic reference."#
                .to_string(),
            opening_instruction: "Survey the following research question and summarise what is currently known about it.".to_string(),
            closing_instruction: r#"Write a concise but information-dense survey in markdown.
End with a list titled "Sources" containing one reference per line."#
                .to_string(),
            llm_call_mode: LLMCallMode::Prompt,
        }
    }

    fn research_material(&self, context: &ResearchContext) -> Vec<Material> {
        if context.task.source_urls.is_empty() {
            return Vec::new();
        }
        vec![(
            "Sources provided by the requester (prioritise these)".to_string(),
            context.task.source_urls.join("\n"),
        )]
    }
}

/// 大纲编辑产出的结构化结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResearchOutline {
    /// 报告标题
    pub title: String,
    /// 章节主题，按写作顺序排列，不包含引言、结论与参考文献
    pub sections: Vec<String>,
    /// 初步调研中引用的来源，每项一个 URL 或文献条目
    pub sources: Vec<String>,
}

/// 大纲编辑：把初步调研整理成标题、章节与来源
pub struct OutlineEditor {
    initial_research: String,
}

impl OutlineEditor {
    pub fn new(initial_research: String) -> Self {
        Self { initial_research }
    }
}

impl StepForwardAgent for OutlineEditor {
    type Output = ResearchOutline;

    fn agent_type(&self) -> AgentType {
        AgentType::OutlineEditor
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are the editor of a research publication. You plan the structure of a research report.
You never write prose for the report itself; you only decide its title, its sections and the sources it will cite."#
                .to_string(),
            opening_instruction: "Plan the outline of a research report answering the query below, based on the initial research.".to_string(),
            closing_instruction: r#"Return:
- title: a short, specific report title;
- sections: section topics in reading order, no more than the maximum number of sections, excluding introduction, conclusion and references;
- sources: every source cited in the initial research, one per item, without duplicates."#
                .to_string(),
            llm_call_mode: LLMCallMode::Extract,
        }
    }

    fn research_material(&self, context: &ResearchContext) -> Vec<Material> {
        vec![
            (
                "Maximum number of sections".to_string(),
                context.task.max_sections.to_string(),
            ),
            ("Initial research".to_string(), self.initial_research.clone()),
        ]
    }

    fn post_process(
        &self,
        mut result: Self::Output,
        _context: &ResearchContext,
    ) -> anyhow::Result<Self::Output> {
        result.title = result.title.trim().trim_start_matches('#').trim().to_string();
        result.sections = result
            .sections
            .into_iter()
            .map(|section| section.trim().trim_start_matches('#').trim().to_string())
            .filter(|section| !section.is_empty())
            .collect();
        Ok(result)
    }
}

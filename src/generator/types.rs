use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 子智能体类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    InitialResearcher,
    OutlineEditor,
    SectionResearcher,
    SectionReviewer,
    SectionReviser,
    ReportWriter,
}

impl Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentType::InitialResearcher => "initial_researcher",
            AgentType::OutlineEditor => "outline_editor",
            AgentType::SectionResearcher => "section_researcher",
            AgentType::SectionReviewer => "section_reviewer",
            AgentType::SectionReviser => "section_reviser",
            AgentType::ReportWriter => "report_writer",
        };
        write!(f, "{}", str)
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ResearchError;
use crate::types::PublishFormats;

fn default_max_sections() -> usize {
    3
}

/// 单次研究运行的任务配置，加载后不可变
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TaskConfig {
    /// 研究问题；运行时会被调用方传入的 query 覆盖
    #[serde(default)]
    pub query: String,

    /// 最多规划的章节数
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,

    /// 导出格式开关；缺省时只导出 markdown
    #[serde(default = "PublishFormats::markdown_only")]
    pub publish_formats: PublishFormats,

    /// 是否在规划后征求人工反馈（当前核心没有交互通道，仅保留字段）
    #[serde(default)]
    pub include_human_feedback: bool,

    /// 是否要求写作遵循 guidelines
    #[serde(default)]
    pub follow_guidelines: bool,

    /// 写作准则
    #[serde(default)]
    pub guidelines: Vec<String>,

    /// 覆盖默认的高能效模型
    #[serde(default)]
    pub model: Option<String>,

    /// 是否输出详细的智能体日志
    #[serde(default)]
    pub verbose: bool,

    /// 用户指定的参考来源，总是排在引用列表最前
    #[serde(default)]
    pub source_urls: Vec<String>,

    /// 引用数量上限
    #[serde(default)]
    pub max_sources: Option<usize>,
}

impl TaskConfig {
    /// 只带 query 的任务，其余字段取默认值
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_sections: default_max_sections(),
            publish_formats: PublishFormats::markdown_only(),
            include_human_feedback: false,
            follow_guidelines: false,
            guidelines: Vec::new(),
            model: None,
            verbose: false,
            source_urls: Vec::new(),
            max_sources: None,
        }
    }

    /// 从 task.json 加载任务配置
    ///
    /// 文件缺失、无法读取、不是 JSON 对象或对象为空时返回 `Configuration` 错误。
    pub fn load(path: &Path) -> Result<Self, ResearchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResearchError::Configuration(format!(
                "unable to read task file {:?} ({}). Please ensure a valid task.json file is present and contains the necessary task information",
                path, e
            ))
        })?;
        Self::parse(&content)
    }

    /// 从 JSON 文本解析任务配置
    pub fn parse(content: &str) -> Result<Self, ResearchError> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ResearchError::Configuration(format!("invalid task JSON: {}", e)))?;

        match value.as_object() {
            Some(object) if !object.is_empty() => {}
            _ => {
                return Err(ResearchError::Configuration(
                    "task file is empty or not a JSON object".to_string(),
                ));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| ResearchError::Configuration(format!("invalid task fields: {}", e)))
    }

    /// 生效的写作准则：只有 follow_guidelines 打开时才返回
    pub fn active_guidelines(&self) -> &[String] {
        if self.follow_guidelines {
            &self.guidelines
        } else {
            &[]
        }
    }
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::report::PublishFormat;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planning,
    Drafting,
    Publishing,
}

impl Stage {
    /// 阶段在进度事件中使用的键
    pub fn key(&self) -> &'static str {
        match self {
            Stage::Planning => "planning",
            Stage::Drafting => "drafting",
            Stage::Publishing => "publishing",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// 单个格式导出失败的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFailure {
    pub format: PublishFormat,
    pub message: String,
}

impl Display for ExportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.format, self.message)
    }
}

/// 研究流水线的错误分类
#[derive(Debug, Error)]
pub enum ResearchError {
    /// 没有可用的任务配置，任何阶段开始前即终止
    #[error("No task found: {0}")]
    Configuration(String),

    /// 某个阶段执行失败，携带原始错误
    #[error("{stage} stage failed: {source:#}")]
    StageFailure {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// 研究状态缺少必需的结构字段，无法组装版面
    #[error("Malformed research state: {0}")]
    MalformedState(String),

    /// 单写字段被再次写入
    #[error("Research state field `{0}` has already been written")]
    FieldAlreadyWritten(&'static str),

    /// 一个或多个格式导出失败
    #[error("Failed to export report ({})", format_failures(.failures))]
    Export { failures: Vec<ExportFailure> },

    #[error("Research run was cancelled")]
    Cancelled,
}

fn format_failures(failures: &[ExportFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResearchError {
    /// 包装阶段错误；取消与配置错误保持原样，避免被二次包装
    pub fn stage(stage: Stage, source: anyhow::Error) -> Self {
        match source.downcast::<ResearchError>() {
            Ok(ResearchError::Cancelled) => ResearchError::Cancelled,
            Ok(ResearchError::Configuration(message)) => ResearchError::Configuration(message),
            Ok(other) => ResearchError::StageFailure {
                stage,
                source: other.into(),
            },
            Err(source) => ResearchError::StageFailure { stage, source },
        }
    }

    /// 出错的阶段（如果有）
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            ResearchError::StageFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// 阶段失败的根因（如果是本模块定义的类型化错误）
    pub fn root_cause(&self) -> Option<&ResearchError> {
        match self {
            ResearchError::StageFailure { source, .. } => source.downcast_ref::<ResearchError>(),
            _ => None,
        }
    }
}

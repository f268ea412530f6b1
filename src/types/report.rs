use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 导出格式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PublishFormat {
    Pdf,
    Docx,
    Markdown,
}

impl PublishFormat {
    /// 导出顺序固定为 pdf、docx、markdown
    pub const ALL: [PublishFormat; 3] = [
        PublishFormat::Pdf,
        PublishFormat::Docx,
        PublishFormat::Markdown,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            PublishFormat::Pdf => "pdf",
            PublishFormat::Docx => "docx",
            PublishFormat::Markdown => "md",
        }
    }
}

impl std::fmt::Display for PublishFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishFormat::Pdf => write!(f, "pdf"),
            PublishFormat::Docx => write!(f, "docx"),
            PublishFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// 各导出格式的开关
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PublishFormats {
    pub markdown: bool,
    pub pdf: bool,
    pub docx: bool,
}

impl PublishFormats {
    pub fn markdown_only() -> Self {
        Self {
            markdown: true,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self, format: PublishFormat) -> bool {
        match format {
            PublishFormat::Pdf => self.pdf,
            PublishFormat::Docx => self.docx,
            PublishFormat::Markdown => self.markdown,
        }
    }

    /// 已启用的格式，按固定导出顺序
    pub fn enabled(&self) -> Vec<PublishFormat> {
        PublishFormat::ALL
            .into_iter()
            .filter(|format| self.is_enabled(*format))
            .collect()
    }
}

/// 报告元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub title: String,
    pub date: String,
}

/// 最终的报告产物，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub content: String,
    pub format: String,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// 发布元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMetadata {
    /// 本次请求导出的格式
    pub formats: Vec<String>,
    /// 已写出的文件
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

/// 发布阶段返回的信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub status: OutcomeStatus,
    pub report: ReportArtifact,
    pub metadata: PublishMetadata,
}

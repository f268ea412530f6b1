//! 调用边界：把研究流程的一切结果（包括 panic）收敛为结构完整的信封

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::generator::workflow::{ChiefEditor, RunOptions};
use crate::progress::{ToolLogger, ToolProgress, ToolProgressAdapter};
use crate::types::Tone;
use crate::utils::CancellationToken;

/// 信封状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// `run` 的返回信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchEnvelope {
    pub status: EnvelopeStatus,
    pub query: String,
    /// 实际生效的语气
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `getSources` 的返回信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesEnvelope {
    pub status: EnvelopeStatus,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 工具调用方可选提供的两种进度能力
#[derive(Clone, Default)]
pub struct ToolCapabilities {
    pub logger: Option<Arc<dyn ToolLogger>>,
    pub progress: Option<Arc<dyn ToolProgress>>,
}

impl ToolCapabilities {
    fn into_options(self, cancel: CancellationToken) -> RunOptions {
        RunOptions::default()
            .with_sink(Arc::new(ToolProgressAdapter::new(self.logger, self.progress)))
            .with_cancel(cancel)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("internal error: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("internal error: {}", message)
    } else {
        "internal error".to_string()
    }
}

/// 研究服务
pub struct ResearchService {
    editor: Arc<ChiefEditor>,
}

impl ResearchService {
    pub fn new(editor: ChiefEditor) -> Self {
        Self {
            editor: Arc::new(editor),
        }
    }

    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self::new(ChiefEditor::from_config(config)?))
    }

    /// 深度研究：未知或缺省的语气回退为 objective
    pub async fn deep_research(
        &self,
        query: &str,
        tone: Option<&str>,
        capabilities: ToolCapabilities,
        cancel: CancellationToken,
    ) -> ResearchEnvelope {
        let tone = tone.map(Tone::parse_or_default).unwrap_or_default();
        let options = capabilities.into_options(cancel);
        self.run(query, tone, options).await
    }

    /// 以给定的运行参数执行研究并封装结果
    pub async fn run(&self, query: &str, tone: Tone, options: RunOptions) -> ResearchEnvelope {
        let outcome = AssertUnwindSafe(self.editor.run(query, tone, options))
            .catch_unwind()
            .await;

        let (report, error) = match outcome {
            Ok(Ok(outcome)) => (Some(outcome.report.content), None),
            Ok(Err(e)) => (None, Some(e.to_string())),
            Err(payload) => (None, Some(panic_message(payload))),
        };

        ResearchEnvelope {
            status: if error.is_none() {
                EnvelopeStatus::Success
            } else {
                EnvelopeStatus::Error
            },
            query: query.to_string(),
            tone,
            report,
            error,
        }
    }

    /// 只执行规划阶段，返回来源列表
    pub async fn get_sources(&self, query: &str, options: RunOptions) -> SourcesEnvelope {
        let outcome = AssertUnwindSafe(self.editor.get_sources(query, options))
            .catch_unwind()
            .await;

        let (sources, error) = match outcome {
            Ok(Ok(sources)) => (Some(sources), None),
            Ok(Err(e)) => (None, Some(e.to_string())),
            Err(payload) => (None, Some(panic_message(payload))),
        };

        SourcesEnvelope {
            status: if error.is_none() {
                EnvelopeStatus::Success
            } else {
                EnvelopeStatus::Error
            },
            query: query.to_string(),
            sources,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_omits_report() {
        let envelope = ResearchEnvelope {
            status: EnvelopeStatus::Error,
            query: "q".to_string(),
            tone: Tone::Objective,
            report: None,
            error: Some("No task found: missing".to_string()),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "status": "error",
                "query": "q",
                "tone": "objective",
                "error": "No task found: missing"
            })
        );
    }

    #[test]
    fn test_panic_payloads_become_messages() {
        assert_eq!(panic_message(Box::new("boom")), "internal error: boom");
        assert_eq!(
            panic_message(Box::new("kaput".to_string())),
            "internal error: kaput"
        );
        assert_eq!(panic_message(Box::new(7u8)), "internal error");
    }
}

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{ProgressEvent, ProgressSink};

/// 工具调用方提供的文本日志能力
#[async_trait]
pub trait ToolLogger: Send + Sync {
    async fn info(&self, message: String);
}

/// 工具调用方提供的数值进度能力
#[async_trait]
pub trait ToolProgress: Send + Sync {
    async fn report_progress(&self, current: u32, total: u32);
}

/// 把进度事件转接到工具调用方的两种可选能力上
///
/// 两种能力都可以缺席；缺席时对应事件被丢弃。
#[derive(Clone, Default)]
pub struct ToolProgressAdapter {
    logger: Option<Arc<dyn ToolLogger>>,
    progress: Option<Arc<dyn ToolProgress>>,
}

impl ToolProgressAdapter {
    pub fn new(
        logger: Option<Arc<dyn ToolLogger>>,
        progress: Option<Arc<dyn ToolProgress>>,
    ) -> Self {
        Self { logger, progress }
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl ProgressSink for ToolProgressAdapter {
    async fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Progress { current, total } => {
                if let Some(progress) = &self.progress {
                    progress.report_progress(current, total).await;
                }
            }
            ProgressEvent::Log { key, value } => {
                if let Some(logger) = &self.logger {
                    logger
                        .info(format!("{}: {}", key, Self::render_value(&value)))
                        .await;
                }
            }
            ProgressEvent::Status { key, message, .. } => {
                if let Some(logger) = &self.logger {
                    logger.info(format!("{}: {}", key, message)).await;
                }
            }
            ProgressEvent::Error { key, message } => {
                if let Some(logger) = &self.logger {
                    logger.info(format!("{}: {}", key, message)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    #[async_trait]
    impl ToolLogger for Lines {
        async fn info(&self, message: String) {
            self.0.lock().unwrap().push(message);
        }
    }

    #[derive(Default)]
    struct Ticks(Mutex<Vec<(u32, u32)>>);

    #[async_trait]
    impl ToolProgress for Ticks {
        async fn report_progress(&self, current: u32, total: u32) {
            self.0.lock().unwrap().push((current, total));
        }
    }

    #[tokio::test]
    async fn test_routes_events_to_matching_capability() {
        let lines = Arc::new(Lines::default());
        let ticks = Arc::new(Ticks::default());
        let adapter = ToolProgressAdapter::new(Some(lines.clone()), Some(ticks.clone()));

        adapter
            .emit(ProgressEvent::Log {
                key: "planner".to_string(),
                value: Value::from("3 sources"),
            })
            .await;
        adapter
            .emit(ProgressEvent::Progress {
                current: 30,
                total: 100,
            })
            .await;

        assert_eq!(*lines.0.lock().unwrap(), vec!["planner: 3 sources"]);
        assert_eq!(*ticks.0.lock().unwrap(), vec![(30, 100)]);
    }

    #[tokio::test]
    async fn test_missing_capabilities_are_tolerated() {
        let adapter = ToolProgressAdapter::default();
        adapter
            .emit(ProgressEvent::Error {
                key: "error".to_string(),
                message: "ignored".to_string(),
            })
            .await;
        adapter
            .emit(ProgressEvent::Progress {
                current: 10,
                total: 100,
            })
            .await;
    }

    #[tokio::test]
    async fn test_structured_log_values_are_rendered_as_json() {
        let lines = Arc::new(Lines::default());
        let adapter = ToolProgressAdapter::new(Some(lines.clone()), None);
        adapter
            .emit(ProgressEvent::Log {
                key: "research_report".to_string(),
                value: serde_json::json!({"status": "complete"}),
            })
            .await;
        assert_eq!(
            *lines.0.lock().unwrap(),
            vec![r#"research_report: {"status":"complete"}"#]
        );
    }
}

//! 进度事件 - 与传输方式解耦的单向事件通道

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

mod adapter;

pub use adapter::{ToolLogger, ToolProgress, ToolProgressAdapter};

/// 进度事件，不持久化，对研究状态没有影响
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// 面向人阅读的键值日志
    #[serde(rename = "logs")]
    Log { key: String, value: Value },
    /// 数值进度
    Progress { current: u32, total: u32 },
    /// 阶段状态
    Status {
        key: String,
        message: String,
        progress: u8,
    },
    Error { key: String, message: String },
}

impl ProgressEvent {
    /// 事件类型：logs / progress / status / error
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Log { .. } => "logs",
            ProgressEvent::Progress { .. } => "progress",
            ProgressEvent::Status { .. } => "status",
            ProgressEvent::Error { .. } => "error",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ProgressEvent::Log { key, .. }
            | ProgressEvent::Status { key, .. }
            | ProgressEvent::Error { key, .. } => key,
            ProgressEvent::Progress { .. } => "progress",
        }
    }
}

/// 进度事件接收端
///
/// `emit` 只产生副作用，不能让流水线失败。
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl ProgressSink for NoopSink {
    async fn emit(&self, _event: ProgressEvent) {}
}

/// 把事件写入本地日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl ProgressSink for TracingSink {
    async fn emit(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Log { key, value } => match value {
                Value::String(text) => tracing::info!(target: "progress", "📝 {}: {}", key, text),
                other => tracing::info!(target: "progress", "📝 {}: {}", key, other),
            },
            ProgressEvent::Progress { current, total } => {
                tracing::info!(target: "progress", "📊 进度 {}/{}", current, total)
            }
            ProgressEvent::Status {
                key,
                message,
                progress,
            } => tracing::info!(target: "progress", "🚀 [{}] {} ({}%)", key, message, progress),
            ProgressEvent::Error { key, message } => {
                tracing::error!(target: "progress", "❌ [{}] {}", key, message)
            }
        }
    }
}

/// 推送给远端观察者的事件通道；接收端关闭后事件被静默丢弃
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// 创建通道并返回接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("进度观察者已断开，事件被丢弃");
        }
    }
}

/// 在内存中按顺序收集事件
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集事件的快照
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// 对 `ProgressSink` 的便捷封装，供各阶段发出事件
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink))
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    pub async fn emit(&self, event: ProgressEvent) {
        self.sink.emit(event).await;
    }

    pub async fn log(&self, key: &str, value: impl Into<Value>) {
        self.emit(ProgressEvent::Log {
            key: key.to_string(),
            value: value.into(),
        })
        .await;
    }

    pub async fn progress(&self, current: u32) {
        self.emit(ProgressEvent::Progress {
            current: current.min(100),
            total: 100,
        })
        .await;
    }

    pub async fn status(&self, key: &str, message: impl Into<String>, progress: u8) {
        self.emit(ProgressEvent::Status {
            key: key.to_string(),
            message: message.into(),
            progress: progress.min(100),
        })
        .await;
    }

    pub async fn error(&self, key: &str, message: impl Into<String>) {
        self.emit(ProgressEvent::Error {
            key: key.to_string(),
            message: message.into(),
        })
        .await;
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

use crate::errors::ResearchError;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// 取消令牌，贯穿每个挂起点
///
/// 克隆后共享同一状态；一旦取消不可恢复。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消，唤醒所有等待者
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            tracing::info!("🛑 已请求取消研究任务");
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// 等待直到令牌被取消
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // 先登记再检查标志，避免错过 notify_waiters
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// 已取消时返回 `Cancelled` 错误
    pub fn check(&self) -> Result<(), ResearchError> {
        if self.is_cancelled() {
            Err(ResearchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// 在取消与给定 future 之间竞争；取消优先
    pub async fn run_until_cancelled<F>(&self, future: F) -> Result<F::Output, ResearchError>
    where
        F: std::future::Future,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ResearchError::Cancelled),
            output = future => Ok(output),
        }
    }
}

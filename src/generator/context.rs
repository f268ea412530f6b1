use std::sync::Arc;

use uuid::Uuid;

use crate::cache::CacheManager;
use crate::config::{Config, TaskConfig};
use crate::progress::ProgressReporter;
use crate::types::Tone;
use crate::utils::CancellationToken;

/// 单次研究运行的上下文，各阶段只读共享
#[derive(Clone)]
pub struct ResearchContext {
    /// 进程级配置
    pub config: Arc<Config>,
    /// 本次运行的任务配置（查询已被调用参数覆盖）
    pub task: Arc<TaskConfig>,
    /// 生效的语气
    pub tone: Tone,
    /// 进度事件出口
    pub reporter: ProgressReporter,
    /// 取消令牌
    pub cancel: CancellationToken,
    /// 模型响应缓存
    pub cache: Arc<CacheManager>,
    pub run_id: Uuid,
}

impl ResearchContext {
    pub fn new(
        config: Arc<Config>,
        task: TaskConfig,
        tone: Tone,
        reporter: ProgressReporter,
        cancel: CancellationToken,
    ) -> Self {
        let cache = Arc::new(CacheManager::new(config.cache.clone()));
        Self {
            config,
            task: Arc::new(task),
            tone,
            reporter,
            cancel,
            cache,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn query(&self) -> &str {
        &self.task.query
    }
}

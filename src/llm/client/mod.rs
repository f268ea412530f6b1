//! LLM客户端 - 为各个研究子智能体提供统一的模型调用接口

use anyhow::{Result, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;

mod providers;
pub mod utils;

use providers::{CallSettings, ProviderClient};
use utils::evaluate_befitting_model;

/// LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(config)?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// 通用重试逻辑，每次尝试都受单次调用超时约束
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let mut retries = 0;

        loop {
            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "model call timed out after {}s",
                    self.config.timeout_seconds
                )),
            };
            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries,
                        max_retries,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    /// 结构化数据提取
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        let settings = CallSettings::new(&self.config, system_prompt);
        let extractor =
            self.client
                .create_extractor::<T>(&befitting_model, &settings, &self.config);
        let first_attempt = self
            .retry_with_backoff(|| async { extractor.extract(user_prompt).await })
            .await;

        match (first_attempt, fallover_model) {
            (Ok(result), _) => Ok(result),
            (Err(e), Some(model)) => {
                tracing::warn!(
                    "❌ 模型 {} 多次提取失败，改用备选模型 {}: {}",
                    befitting_model,
                    model,
                    e
                );
                let user_prompt_with_fixer = format!(
                    "{}\n\nNote: a previous attempt failed with \"{}\". Avoid repeating that error.",
                    user_prompt, e
                );
                let extractor =
                    self.client
                        .create_extractor::<T>(&model, &settings, &self.config);
                self.retry_with_backoff(|| async {
                    extractor.extract(&user_prompt_with_fixer).await
                })
                .await
            }
            (Err(e), None) => Err(e),
        }
    }

    /// 单轮对话
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, _) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);
        let agent = self
            .client
            .create_agent(&befitting_model, &CallSettings::new(&self.config, system_prompt));

        self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
    }

    /// 任务级的高能效模型覆盖
    pub fn with_efficient_model(&self, model: Option<&str>) -> Self {
        let mut client = self.clone();
        if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
            client.config.model_efficient = model.to_string();
        }
        client
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }
}

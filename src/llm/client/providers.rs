//! 各模型服务商的客户端、agent 与 extractor

use anyhow::Result;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, extractor::Extractor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{LLMConfig, LLMProvider};

/// 对每个服务商变体执行同一段代码
macro_rules! each_provider {
    ($value:expr, $kind:ident, $inner:ident => $body:expr) => {
        match $value {
            $kind::OpenAI($inner) => $body,
            $kind::DeepSeek($inner) => $body,
            $kind::Mistral($inner) => $body,
            $kind::OpenRouter($inner) => $body,
            $kind::Anthropic($inner) => $body,
            $kind::Ollama($inner) => $body,
        }
    };
}

/// 以统一的调用参数装配 agent
macro_rules! build_agent {
    ($builder:expr, $settings:expr) => {{
        let settings: &CallSettings = $settings;
        let builder = $builder
            .preamble(settings.system_prompt)
            .temperature(settings.temperature);
        match settings.max_tokens {
            Some(max_tokens) => builder.max_tokens(max_tokens).build(),
            None => builder.build(),
        }
    }};
}

/// 以统一的调用参数装配 extractor
macro_rules! build_extractor {
    ($builder:expr, $settings:expr) => {{
        let settings: &CallSettings = $settings;
        let builder = $builder.preamble(settings.system_prompt);
        match settings.max_tokens {
            Some(max_tokens) => builder.max_tokens(max_tokens).build(),
            None => builder.build(),
        }
    }};
}

/// 单次模型调用的参数
#[derive(Debug, Clone, PartialEq)]
pub struct CallSettings<'a> {
    pub system_prompt: &'a str,
    pub temperature: f64,
    /// 为空时不向服务商发送输出上限
    pub max_tokens: Option<u64>,
}

impl<'a> CallSettings<'a> {
    pub fn new(config: &LLMConfig, system_prompt: &'a str) -> Self {
        Self {
            system_prompt,
            temperature: config.temperature,
            max_tokens: config
                .provider
                .accepts_max_tokens()
                .then_some(u64::from(config.max_tokens)),
        }
    }

    /// 结构化提取总是带上输出上限
    fn for_extraction(&self, config: &LLMConfig) -> Self {
        Self {
            max_tokens: Some(u64::from(config.max_tokens)),
            ..self.clone()
        }
    }
}

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Mistral(rig::providers::mistral::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let key = config.api_key.as_str();
        let base_url = config.api_base_url.as_str();
        tracing::debug!("🔌 创建模型客户端: {} ({})", config.provider, base_url);

        let client = match config.provider {
            LLMProvider::OpenAI => ProviderClient::OpenAI(
                rig::providers::openai::Client::builder(key)
                    .base_url(base_url)
                    .build(),
            ),
            LLMProvider::DeepSeek => ProviderClient::DeepSeek(
                rig::providers::deepseek::Client::builder(key)
                    .base_url(base_url)
                    .build(),
            ),
            LLMProvider::Mistral => {
                ProviderClient::Mistral(rig::providers::mistral::Client::builder(key).build())
            }
            LLMProvider::OpenRouter => ProviderClient::OpenRouter(
                rig::providers::openrouter::Client::builder(key).build(),
            ),
            LLMProvider::Anthropic => ProviderClient::Anthropic(
                rig::providers::anthropic::ClientBuilder::new(key).build()?,
            ),
            LLMProvider::Ollama => {
                ProviderClient::Ollama(rig::providers::ollama::Client::builder().build())
            }
        };
        Ok(client)
    }

    /// 自由文本 agent；OpenAI 走 chat completions 接口
    pub fn create_agent(&self, model: &str, settings: &CallSettings) -> ProviderAgent {
        match self {
            ProviderClient::OpenAI(client) => ProviderAgent::OpenAI(build_agent!(
                client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder(),
                settings
            )),
            ProviderClient::DeepSeek(client) => {
                ProviderAgent::DeepSeek(build_agent!(client.agent(model), settings))
            }
            ProviderClient::Mistral(client) => {
                ProviderAgent::Mistral(build_agent!(client.agent(model), settings))
            }
            ProviderClient::OpenRouter(client) => {
                ProviderAgent::OpenRouter(build_agent!(client.agent(model), settings))
            }
            ProviderClient::Anthropic(client) => {
                ProviderAgent::Anthropic(build_agent!(client.agent(model), settings))
            }
            ProviderClient::Ollama(client) => {
                ProviderAgent::Ollama(build_agent!(client.agent(model), settings))
            }
        }
    }

    /// 结构化输出 extractor
    pub fn create_extractor<T>(
        &self,
        model: &str,
        settings: &CallSettings,
        config: &LLMConfig,
    ) -> ProviderExtractor<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let settings = &settings.for_extraction(config);
        match self {
            ProviderClient::OpenAI(client) => ProviderExtractor::OpenAI(build_extractor!(
                client.extractor_completions_api::<T>(model),
                settings
            )),
            ProviderClient::DeepSeek(client) => {
                ProviderExtractor::DeepSeek(build_extractor!(client.extractor::<T>(model), settings))
            }
            ProviderClient::Mistral(client) => {
                ProviderExtractor::Mistral(build_extractor!(client.extractor::<T>(model), settings))
            }
            ProviderClient::OpenRouter(client) => ProviderExtractor::OpenRouter(build_extractor!(
                client.extractor::<T>(model),
                settings
            )),
            ProviderClient::Anthropic(client) => ProviderExtractor::Anthropic(build_extractor!(
                client.extractor::<T>(model),
                settings
            )),
            ProviderClient::Ollama(client) => {
                ProviderExtractor::Ollama(build_extractor!(client.extractor::<T>(model), settings))
            }
        }
    }
}

pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Mistral(Agent<rig::providers::mistral::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        each_provider!(self, ProviderAgent, agent => Ok(agent.prompt(prompt).await?))
    }
}

pub enum ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    OpenAI(Extractor<rig::providers::openai::CompletionModel, T>),
    DeepSeek(Extractor<rig::providers::deepseek::CompletionModel, T>),
    Mistral(Extractor<rig::providers::mistral::CompletionModel, T>),
    OpenRouter(Extractor<rig::providers::openrouter::CompletionModel, T>),
    Anthropic(Extractor<rig::providers::anthropic::completion::CompletionModel, T>),
    Ollama(Extractor<rig::providers::ollama::CompletionModel<reqwest::Client>, T>),
}

impl<T> ProviderExtractor<T>
where
    T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
{
    pub async fn extract(&self, prompt: &str) -> Result<T> {
        each_provider!(self, ProviderExtractor, extractor => Ok(extractor.extract(prompt).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: LLMProvider) -> LLMConfig {
        LLMConfig {
            provider,
            api_key: "test-key".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            ..LLMConfig::default()
        }
    }

    #[test]
    fn test_output_cap_follows_provider() {
        let settings = CallSettings::new(&config(LLMProvider::Anthropic), "sys");
        assert_eq!(settings.max_tokens, Some(4096));
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.system_prompt, "sys");

        let settings = CallSettings::new(&config(LLMProvider::DeepSeek), "sys");
        assert_eq!(settings.max_tokens, None);
    }

    #[test]
    fn test_extraction_is_always_capped() {
        let config = config(LLMProvider::Mistral);
        let settings = CallSettings::new(&config, "sys").for_extraction(&config);
        assert_eq!(settings.max_tokens, Some(4096));
    }

    #[test]
    fn test_client_matches_configured_provider() {
        assert!(matches!(
            ProviderClient::new(&config(LLMProvider::OpenAI)).unwrap(),
            ProviderClient::OpenAI(_)
        ));
        assert!(matches!(
            ProviderClient::new(&config(LLMProvider::Ollama)).unwrap(),
            ProviderClient::Ollama(_)
        ));
    }
}

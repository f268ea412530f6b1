use crate::config::{Config, FailurePolicy, LLMProvider, TaskConfig};
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "deep-research.toml";

/// deep-research-rs - 由Rust与AI驱动的多智能体研究报告引擎
#[derive(Parser, Debug)]
#[command(name = "deep-research-rs")]
#[command(
    about = "Multi-agent research engine: plans, drafts and publishes a structured report for a single natural-language query."
)]
#[command(version)]
pub struct Args {
    /// 研究问题；缺省时使用任务配置中的 query
    #[arg(short, long)]
    pub query: Option<String>,

    /// 报告语气 (objective, critical, optimistic, balanced, skeptical)
    #[arg(long)]
    pub tone: Option<String>,

    /// 只执行规划阶段并输出来源列表
    #[arg(long)]
    pub sources_only: bool,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 任务配置文件路径 (task.json)
    #[arg(short, long)]
    pub task: Option<PathBuf>,

    /// 报告输出根目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 高能效模型，用于常规的调研与写作
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长上下文任务，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 章节并发写作的上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 章节失败策略 (fail_fast, collect_partial)
    #[arg(long)]
    pub failure_policy: Option<String>,

    /// LLM Provider (openai, deepseek, mistral, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 目标语言 (en, zh, ja, de, fr)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path).with_context(|| {
                        format!("无法读取默认配置文件 {:?}", default_config_path)
                    })?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(task) = self.task {
            config.task_path = task;
        }
        if let Some(output_path) = self.output_path {
            config.publisher.output_path = Some(output_path);
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    "⚠️ 未知的provider: {}，使用 {}",
                    provider_str,
                    config.llm.provider
                ),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 起草配置
        if let Some(max_parallels) = self.max_parallels {
            config.drafting.max_parallels = max_parallels.max(1);
        }
        if let Some(policy_str) = self.failure_policy {
            match policy_str.parse::<FailurePolicy>() {
                Ok(policy) => config.drafting.failure_policy = policy,
                Err(_) => tracing::warn!("⚠️ 未知的失败策略: {}，使用 fail_fast", policy_str),
            }
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            match target_language_str.parse::<TargetLanguage>() {
                Ok(target_language) => config.target_language = target_language,
                Err(_) => tracing::warn!(
                    "⚠️ 未知的目标语言: {}，使用 {}",
                    target_language_str,
                    config.target_language
                ),
            }
        }

        if self.no_cache {
            config.cache.enabled = false;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

/// 确定本次运行的研究问题：命令行优先，其次为任务配置中的 query
pub fn resolve_query(cli_query: Option<&str>, config: &Config) -> Result<String> {
    if let Some(query) = cli_query.map(str::trim).filter(|q| !q.is_empty()) {
        return Ok(query.to_string());
    }
    if config.task_path.exists() {
        let task = TaskConfig::load(&config.task_path)?;
        if !task.query.trim().is_empty() {
            return Ok(task.query);
        }
    }
    bail!(
        "no research query given: pass --query or set `query` in {:?}",
        config.task_path
    )
}

/// 是否输出 debug 级日志：配置或任务任一开启 verbose 即可
///
/// 任务文件缺失或无法解析时只看配置。
pub fn wants_debug_logging(config: &Config) -> bool {
    config.verbose
        || TaskConfig::load(&config.task_path)
            .map(|task| task.verbose)
            .unwrap_or(false)
}

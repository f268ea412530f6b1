use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LLMConfig;
use crate::generator::context::ResearchContext;
use crate::generator::types::AgentType;
use crate::llm::LLMClient;

/// LLM调用方式配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LLMCallMode {
    /// 使用extract方法，返回特定要求的结构化数据
    Extract,
    /// 使用prompt方法，返回自由文本
    Prompt,
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
    /// LLM调用方式
    pub llm_call_mode: LLMCallMode,
}

/// 一段调研材料：(标题, 正文)
pub type Material = (String, String);

/// 拼装标准的用户提示词
pub fn build_user_prompt(
    context: &ResearchContext,
    template: &PromptTemplate,
    materials: &[Material],
) -> String {
    let mut prompt = String::new();
    prompt.push_str(&template.opening_instruction);
    prompt.push_str("\n\n## Research query\n");
    prompt.push_str(context.query());
    prompt.push_str("\n\n## Tone\n");
    prompt.push_str(context.tone.instruction());
    prompt.push('\n');

    let guidelines = context.task.active_guidelines();
    if !guidelines.is_empty() {
        prompt.push_str("\n## Guidelines\n");
        for guideline in guidelines {
            prompt.push_str(&format!("- {}\n", guideline));
        }
    }

    for (heading, body) in materials {
        if body.trim().is_empty() {
            continue;
        }
        prompt.push_str(&format!("\n## {}\n{}\n", heading, body));
    }

    prompt.push('\n');
    prompt.push_str(&template.closing_instruction);
    prompt
}

/// 缓存键：模型与完整 prompt
fn cache_key(llm_config: &LLMConfig, system_prompt: &str, user_prompt: &str) -> String {
    format!(
        "{}|{}\n\n{}\n\n{}",
        llm_config.model_efficient, llm_config.model_powerful, system_prompt, user_prompt
    )
}

/// 研究子智能体的统一契约
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// Agent的输出类型 - 必须支持JSON序列化
    type Output: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;

    fn agent_type(&self) -> AgentType;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 插入到提示词中的调研材料
    fn research_material(&self, _context: &ResearchContext) -> Vec<Material> {
        Vec::new()
    }

    /// 可选的后处理钩子
    fn post_process(&self, result: Self::Output, _context: &ResearchContext) -> Result<Self::Output> {
        Ok(result)
    }

    /// 默认实现的execute方法：构建prompt、查缓存、调用模型、写缓存
    async fn execute(&self, context: &ResearchContext, llm: &LLMClient) -> Result<Self::Output> {
        context.cancel.check()?;

        let llm = &llm.with_efficient_model(context.task.model.as_deref());
        let agent_type = self.agent_type();
        let template = self.prompt_template();
        let system_prompt = format!(
            "{}\n\n{}",
            template.system_prompt,
            context.config.target_language.prompt_instruction()
        );
        let user_prompt = build_user_prompt(context, &template, &self.research_material(context));

        let category = agent_type.to_string();
        let cache_key = cache_key(llm.config(), &system_prompt, &user_prompt);
        let cached = context
            .cache
            .get::<Value>(&category, &cache_key)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("⚠️ 读取缓存失败 [{}]: {}", category, e);
                None
            });

        let result_value = match cached {
            Some(value) => value,
            None => {
                tracing::debug!("🤖 Sub-Agent [{}] 调用模型", agent_type);
                let value = match template.llm_call_mode {
                    LLMCallMode::Extract => {
                        let result: Self::Output = context
                            .cancel
                            .run_until_cancelled(llm.extract(&system_prompt, &user_prompt))
                            .await??;
                        serde_json::to_value(&result)?
                    }
                    LLMCallMode::Prompt => {
                        let text = context
                            .cancel
                            .run_until_cancelled(llm.prompt(&system_prompt, &user_prompt))
                            .await??;
                        Value::String(text)
                    }
                };
                if let Err(e) = context
                    .cache
                    .set(&category, &cache_key, &value, Some(llm.config().model_efficient.clone()))
                    .await
                {
                    tracing::warn!("⚠️ 写入缓存失败 [{}]: {}", category, e);
                }
                value
            }
        };

        let typed_result = serde_json::from_value::<Self::Output>(result_value)
            .with_context(|| format!("unexpected output from agent `{}`", agent_type))?;
        let result = self.post_process(typed_result, context)?;
        tracing::info!("✅ Sub-Agent [{}]执行完成", agent_type);
        Ok(result)
    }
}

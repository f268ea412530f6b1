use crate::config::LLMConfig;

/// 超过该长度的 prompt 直接交给高质量模型
const EFFICIENT_PROMPT_LIMIT: usize = 32 * 1024;

/// 根据 prompt 长度选择模型，返回 (首选模型, 备选模型)
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_PROMPT_LIMIT {
        return (
            llm_config.model_efficient.clone(),
            Some(llm_config.model_powerful.clone()),
        );
    }
    (llm_config.model_powerful.clone(), None)
}

//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use message::{Message, Role};
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage, DEFAULT_OPENAI_MODEL};
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;

/// 按配置创建 LLM 客户端：provider 为 deepseek / openai / mock
///
/// 未知 provider 直接返回 Configuration 错误；Key 缺失不在这里判断，而是在每次调用时检查。
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let timeout = Duration::from_secs(cfg.llm.timeout_secs);
    match cfg.llm.provider.trim().to_lowercase().as_str() {
        "deepseek" => {
            let mut client = create_deepseek_client(cfg.llm.deepseek.model.as_deref());
            if let Some(base) = cfg.llm.base_url.as_deref() {
                client = client.with_base_url(base);
            }
            tracing::info!("Using DeepSeek LLM ({})", client.model());
            Ok(Arc::new(client.with_timeout(timeout)))
        }
        "openai" => {
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
            tracing::info!("Using OpenAI LLM ({})", model);
            Ok(Arc::new(
                OpenAiClient::from_env(cfg.llm.base_url.as_deref(), &model).with_timeout(timeout),
            ))
        }
        "mock" => {
            tracing::info!("Using Mock LLM");
            Ok(Arc::new(MockLlmClient))
        }
        other => Err(LlmError::Configuration(format!(
            "unknown llm provider '{other}' (expected deepseek, openai or mock)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_provider(provider: &str) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = provider.to_string();
        cfg
    }

    #[test]
    fn test_factory_selects_provider() {
        assert_eq!(create_llm_from_config(&with_provider("mock")).unwrap().name(), "Mock");
        assert_eq!(
            create_llm_from_config(&with_provider("DeepSeek")).unwrap().name(),
            "DeepSeek"
        );
        assert_eq!(create_llm_from_config(&with_provider("openai")).unwrap().name(), "OpenAI");
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let err = create_llm_from_config(&with_provider("claude")).err().unwrap();
        assert!(matches!(err, LlmError::Configuration(ref m) if m.contains("claude")));
    }
}

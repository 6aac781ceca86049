//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：给定消息或单条 prompt，异步返回原始文本。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::Message;

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// 缺少凭据等配置问题，在发起网络请求之前检出
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 上游返回非 2xx
    #[error("{provider} API error {status}: {message}")]
    Transport {
        provider: String,
        status: u16,
        message: String,
    },

    /// 未拿到任何 HTTP 响应（连接失败、超时）
    #[error("Network error: {0}")]
    Network(String),

    /// 请求成功但没有可提取的文本
    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl LlmError {
    /// 上游 HTTP 状态码（仅 Transport 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 后端名（用于日志与结果标注）
    fn name(&self) -> &str;

    /// 以完整消息列表调用
    async fn complete_messages(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 单条 prompt 作为 user 消息调用
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete_messages(&[Message::user(prompt)]).await
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

//! OpenAI 兼容 API 客户端
//!
//! 请求体由 async_openai 的类型构建，经 reqwest 发往任意 OpenAI 兼容端点（可配置 base_url）；
//! 直接持有 HTTP 响应，以便把非 2xx 状态码原样带入 LlmError::Transport。
//! API Key 在每次调用时检查，缺失则在发请求前返回 LlmError::Configuration。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;

use crate::llm::{LlmClient, LlmError, Message, Role};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// Chat Completions 响应中用到的部分
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// OpenAI 兼容客户端：持有 HTTP client、端点、model 与（可能缺失的）API Key
pub struct OpenAiClient {
    /// 构建失败（如 TLS 后端初始化失败）时保留错误，调用时返回
    http: Result<reqwest::Client, LlmError>,
    provider: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: &'static str,
    temperature: f32,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    /// api_key 为 None 时客户端仍可创建，但每次调用都会返回 Configuration 错误
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        Self {
            http: build_http(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            provider: "OpenAI".to_string(),
            base_url: base_url.unwrap_or(OPENAI_BASE_URL).to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
            api_key_env: OPENAI_API_KEY_ENV,
            temperature: DEFAULT_TEMPERATURE,
            usage: TokenUsage::new(),
        }
    }

    /// 从环境变量 `OPENAI_API_KEY` 读取 Key
    pub fn from_env(base_url: Option<&str>, model: &str) -> Self {
        let api_key = std::env::var(OPENAI_API_KEY_ENV).ok();
        Self::new(base_url, model, api_key.as_deref())
    }

    /// 设置后端名与对应的 Key 环境变量名（仅影响日志与错误信息）
    pub fn with_provider(mut self, name: impl Into<String>, api_key_env: &'static str) -> Self {
        self.provider = name.into();
        self.api_key_env = api_key_env;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(LlmError::Configuration(format!(
                "{} is not set; {} client cannot be used",
                self.api_key_env, self.provider
            ))),
        }
    }

    fn build_request(&self, messages: &[Message]) -> Result<CreateChatCompletionRequest, OpenAIError> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_openai_messages(messages)?)
            .temperature(self.temperature)
            .build()
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            tracing::warn!("Failed to build HTTP client with timeout {:?}: {}", timeout, e);
            LlmError::Configuration(format!("failed to build HTTP client: {e}"))
        })
}

fn to_openai_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    messages
        .iter()
        .map(|m| {
            Ok(match m.role {
                Role::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()?,
                ),
                Role::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()?,
                ),
                Role::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()?,
                ),
            })
        })
        .collect()
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.provider
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete_messages(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let http = self.http.as_ref().map_err(Clone::clone)?;
        let request = self
            .build_request(messages)
            .map_err(|e| LlmError::Configuration(format!("invalid request: {e}")))?;

        let response = http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Transport {
                provider: self.provider.clone(),
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        // 提取 token 使用统计
        if let Some(usage) = &body.usage {
            self.usage.add(usage.prompt_tokens, usage.completion_tokens);
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse(self.provider.clone()))
    }
}

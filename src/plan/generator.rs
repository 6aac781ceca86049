//! PlanGenerator：项目描述 → 经校验的项目计划
//!
//! 拼 system（格式要求 + Schema）与 user（项目描述）消息，agent 为「调用 LLM → 提取 JSON」，
//! 交给 RetryPolicy 反复执行直到产出通过 Schema 校验，最后反序列化为 ProjectPlan。

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::core::{RetryError, RetryPolicy};
use crate::llm::{LlmClient, Message};
use crate::plan::{extract_json, PlanDocument, ProjectPlan};
use crate::schema::{JsonSchema, SchemaError, SchemaKind};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Project description is empty")]
    EmptyDescription,

    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// 通过了 Schema 校验却无法映射到 ProjectPlan（自定义 Schema 与结构不一致）
    #[error("Validated output does not match the plan structure: {0}")]
    Decode(String),
}

pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    schema: SchemaKind,
    language: String,
}

impl PlanGenerator {
    /// 默认：重试 2 次、Schema 由 ProjectPlan 生成、英文输出
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            policy: RetryPolicy::default(),
            schema: SchemaKind::Json(JsonSchema::for_type::<ProjectPlan>()),
            language: "en".to_string(),
        }
    }

    /// 按 [retry] 与 [plan] 段配置；schema_path 指向的文件在此加载
    pub fn from_config(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Result<Self, PlanError> {
        let mut generator = Self::new(llm)
            .with_policy(cfg.retry.policy())
            .with_language(cfg.plan.language.clone());
        if let Some(path) = &cfg.plan.schema_path {
            generator = generator.with_schema(JsonSchema::from_file(path)?);
        }
        Ok(generator)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<SchemaKind>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are a senior project planner. Turn the user's project description into a \
             delivery plan.\n\
             Reply with exactly one JSON object and nothing else: no Markdown, no commentary.\n\
             Write every human-readable string in language '{}'.\n\
             The JSON object must conform to this JSON Schema:\n{}",
            self.language,
            self.schema.describe()
        )
    }

    pub async fn generate(&self, description: &str) -> Result<PlanDocument, PlanError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PlanError::EmptyDescription);
        }

        let messages = vec![
            Message::system(self.system_prompt()),
            Message::user(description),
        ];
        let llm = self.llm.as_ref();
        let messages = messages.as_slice();

        tracing::info!(provider = llm.name(), "generating project plan");
        let value = self
            .policy
            .run(
                move || async move {
                    let text = llm
                        .complete_messages(messages)
                        .await
                        .map_err(|e| e.to_string())?;
                    extract_json(&text)
                },
                &self.schema,
            )
            .await?;

        let plan: ProjectPlan =
            serde_json::from_value(value).map_err(|e| PlanError::Decode(e.to_string()))?;
        let (prompt_tokens, completion_tokens, _) = llm.token_usage();
        tracing::info!(
            phases = plan.phases.len(),
            tasks = plan.task_count(),
            prompt_tokens,
            completion_tokens,
            "project plan ready"
        );

        Ok(PlanDocument {
            plan,
            provider: llm.name().to_string(),
            generated_at: Utc::now(),
        })
    }
}

//! Planwright - LLM 项目规划生成
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 校验重试控制器（有界重试 + Schema 校验）与错误分类
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: tracing 日志初始化
//! - **plan**: 项目描述 → 经校验的项目计划
//! - **schema**: Schema 与校验器（JSON Schema / 结构约束）

pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod plan;
pub mod schema;

pub use crate::core::{validated_retry, AttemptFailure, RetryError, RetryPolicy};
pub use plan::{PlanDocument, PlanError, PlanGenerator, ProjectPlan};
pub use schema::{JsonSchema, Schema, SchemaKind, ShapeSchema, ValidationOutcome, Validator};

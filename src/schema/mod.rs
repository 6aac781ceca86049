//! Schema 层：声明式结构约束与校验器
//!
//! Schema 先 compile 为 Validator（每次重试调用只编译一次），Validator 对值给出确定性的校验结果。
//! - **json**: JSON Schema 文档（jsonschema 编译，或由 schemars 从 Rust 类型生成）
//! - **shape**: 轻量结构约束（必需字段 + 值类型）

pub mod json;
pub mod shape;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use json::{CompiledJsonSchema, JsonSchema};
pub use shape::{ShapeSchema, ShapeValidator, ValueKind};

/// Schema 自身有误（属于调用方错误，不计入重试次数）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error("Failed to load schema from {path}: {reason}")]
    Load { path: String, reason: String },
}

/// 单条校验错误：path 为 JSON Pointer（根为空串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn root(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

/// 校验结果：errors 为空当且仅当通过
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn invalid(errors: Vec<ValidationIssue>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ValidationIssue> {
        self.errors
    }
}

/// 已编译的校验器：纯函数，同一 (schema, value) 恒得相同结论
pub trait Validator<T: ?Sized> {
    fn validate(&self, value: &T) -> ValidationOutcome;
}

/// 声明式 Schema：compile 一次得到 Validator；畸形 Schema 在此处失败
pub trait Schema<T: ?Sized> {
    type Validator: Validator<T>;

    fn compile(&self) -> Result<Self::Validator, SchemaError>;
}

/// 运行时选择的 Schema 族（如由配置决定用 JSON Schema 文件还是结构约束）
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Json(JsonSchema),
    Shape(ShapeSchema),
}

/// SchemaKind 对应的已编译校验器
pub enum AnyValidator {
    Json(CompiledJsonSchema),
    Shape(ShapeValidator),
}

impl SchemaKind {
    /// 嵌入 prompt 的 Schema 描述（JSON 文本）
    pub fn describe(&self) -> String {
        match self {
            SchemaKind::Json(schema) => {
                serde_json::to_string_pretty(schema.document()).unwrap_or_default()
            }
            SchemaKind::Shape(shape) => shape.describe(),
        }
    }
}

impl From<JsonSchema> for SchemaKind {
    fn from(schema: JsonSchema) -> Self {
        SchemaKind::Json(schema)
    }
}

impl From<ShapeSchema> for SchemaKind {
    fn from(schema: ShapeSchema) -> Self {
        SchemaKind::Shape(schema)
    }
}

impl Schema<Value> for SchemaKind {
    type Validator = AnyValidator;

    fn compile(&self) -> Result<AnyValidator, SchemaError> {
        match self {
            SchemaKind::Json(schema) => schema.compile().map(AnyValidator::Json),
            SchemaKind::Shape(schema) => schema.compile().map(AnyValidator::Shape),
        }
    }
}

impl Validator<Value> for AnyValidator {
    fn validate(&self, value: &Value) -> ValidationOutcome {
        match self {
            AnyValidator::Json(v) => v.validate(value),
            AnyValidator::Shape(v) => v.validate(value),
        }
    }
}

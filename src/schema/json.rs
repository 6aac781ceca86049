//! JSON Schema：文档由调用方提供、从文件加载，或由 schemars 从 Rust 类型自动生成

use std::path::Path;

use jsonschema::JSONSchema;
use serde_json::Value;

use super::{Schema, SchemaError, ValidationIssue, ValidationOutcome, Validator};

/// JSON Schema 文档（未编译）
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    document: Value,
}

impl JsonSchema {
    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// 从 JSON 文件加载；读取或解析失败返回 SchemaError::Load
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let load_err = |reason: String| SchemaError::Load {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let document = serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?;
        Ok(Self { document })
    }

    /// 由 schemars 根据类型定义生成 Schema（Option 字段为可选，其余必需）
    ///
    /// 序列化失败时退化为 `false`（拒绝一切值）
    pub fn for_type<T: schemars::JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        Self {
            document: document_or_reject(serde_json::to_value(root)),
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

fn document_or_reject(document: Result<Value, serde_json::Error>) -> Value {
    document.unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize generated schema, rejecting all values: {}", e);
        Value::Bool(false)
    })
}

/// 编译后的 JSON Schema 校验器
pub struct CompiledJsonSchema {
    inner: JSONSchema,
}

impl Schema<Value> for JsonSchema {
    type Validator = CompiledJsonSchema;

    fn compile(&self) -> Result<CompiledJsonSchema, SchemaError> {
        let inner = JSONSchema::compile(&self.document)
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;
        Ok(CompiledJsonSchema { inner })
    }
}

impl Validator<Value> for CompiledJsonSchema {
    fn validate(&self, value: &Value) -> ValidationOutcome {
        match self.inner.validate(value) {
            Ok(()) => ValidationOutcome::valid(),
            Err(errors) => ValidationOutcome::invalid(
                errors
                    .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
                    .collect(),
            ),
        }
    }
}

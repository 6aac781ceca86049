//! 轻量结构约束：顶层必须是对象，列出必需字段及可选的值类型

use std::collections::BTreeMap;

use serde_json::Value;

use super::{Schema, SchemaError, ValidationIssue, ValidationOutcome, Validator};

/// 字段值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
    Any,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Null => "null",
            ValueKind::Any => "any",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Number => value.is_number(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Array => value.is_array(),
            ValueKind::Object => value.is_object(),
            ValueKind::Null => value.is_null(),
            ValueKind::Any => true,
        }
    }
}

/// 结构约束（builder 方式声明必需字段）
#[derive(Debug, Clone, Default)]
pub struct ShapeSchema {
    fields: Vec<(String, ValueKind)>,
}

impl ShapeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(self, key: impl Into<String>) -> Self {
        self.require_kind(key, ValueKind::Any)
    }

    pub fn require_kind(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push((key.into(), kind));
        self
    }

    /// 以 {"字段": "类型"} 形式描述，用于拼入 prompt
    pub fn describe(&self) -> String {
        let map: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, kind)| (k.clone(), Value::String(kind.as_str().to_string())))
            .collect();
        serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
    }
}

/// 编译后的结构校验器（字段已去重）
#[derive(Debug, Clone)]
pub struct ShapeValidator {
    fields: BTreeMap<String, ValueKind>,
}

impl Schema<Value> for ShapeSchema {
    type Validator = ShapeValidator;

    /// 同一字段重复声明且类型冲突视为畸形 Schema
    fn compile(&self) -> Result<ShapeValidator, SchemaError> {
        let mut fields = BTreeMap::new();
        for (key, kind) in &self.fields {
            if key.is_empty() {
                return Err(SchemaError::Invalid("empty field name".to_string()));
            }
            match fields.insert(key.clone(), *kind) {
                Some(prev) if prev != *kind => {
                    return Err(SchemaError::Invalid(format!(
                        "field '{}' declared as both {} and {}",
                        key,
                        prev.as_str(),
                        kind.as_str()
                    )));
                }
                _ => {}
            }
        }
        Ok(ShapeValidator { fields })
    }
}

impl Validator<Value> for ShapeValidator {
    fn validate(&self, value: &Value) -> ValidationOutcome {
        let Some(obj) = value.as_object() else {
            return ValidationOutcome::invalid(vec![ValidationIssue::root(format!(
                "expected object, got {}",
                kind_name(value)
            ))]);
        };

        let errors = self
            .fields
            .iter()
            .filter_map(|(key, kind)| match obj.get(key) {
                None => Some(ValidationIssue::root(format!(
                    "missing required property '{key}'"
                ))),
                Some(v) if !kind.matches(v) => Some(ValidationIssue::new(
                    format!("/{}", escape_pointer(key)),
                    format!("expected {}, got {}", kind.as_str(), kind_name(v)),
                )),
                Some(_) => None,
            })
            .collect();
        ValidationOutcome::invalid(errors)
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// RFC 6901
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

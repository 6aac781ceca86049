//! 重试控制器的错误分类
//!
//! 单次尝试的失败（AttemptFailure）只在循环内部记录，不会抛出；
//! 越过控制器边界的只有 RetryError（预算耗尽 / Schema 配置错误 / 可选截止时间到达）。

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::schema::{SchemaError, ValidationIssue};

/// 一次尝试的失败诊断：校验错误或 agent 自身报错
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Validation(Vec<ValidationIssue>),
    Agent(String),
}

impl AttemptFailure {
    pub fn is_validation(&self) -> bool {
        matches!(self, AttemptFailure::Validation(_))
    }
}

impl fmt::Display for AttemptFailure {
    /// 校验错误序列化为 JSON 数组；agent 错误原样输出消息
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Validation(issues) => {
                let serialized =
                    serde_json::to_string(issues).map_err(|_| fmt::Error)?;
                f.write_str(&serialized)
            }
            AttemptFailure::Agent(msg) => f.write_str(msg),
        }
    }
}

/// 越过控制器边界的终止错误
#[derive(Error, Debug)]
pub enum RetryError {
    #[error("Validation failed after {max_retries} retries: {last}")]
    BudgetExhausted {
        max_retries: u32,
        attempts: u32,
        last: AttemptFailure,
    },

    #[error(transparent)]
    SchemaConfiguration(#[from] SchemaError),

    #[error("Deadline of {deadline:?} exceeded after {attempts} attempts{}", last_suffix(.last))]
    DeadlineExceeded {
        deadline: Duration,
        attempts: u32,
        last: Option<AttemptFailure>,
    },
}

impl RetryError {
    /// 最近一次失败的诊断（Schema 配置错误时无）
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        match self {
            RetryError::BudgetExhausted { last, .. } => Some(last),
            RetryError::DeadlineExceeded { last, .. } => last.as_ref(),
            RetryError::SchemaConfiguration(_) => None,
        }
    }

    /// 实际调用 agent 的次数
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::BudgetExhausted { attempts, .. }
            | RetryError::DeadlineExceeded { attempts, .. } => *attempts,
            RetryError::SchemaConfiguration(_) => 0,
        }
    }
}

fn last_suffix(last: &Option<AttemptFailure>) -> String {
    match last {
        Some(failure) => format!(": {failure}"),
        None => String::new(),
    }
}

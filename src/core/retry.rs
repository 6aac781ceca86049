//! 校验重试控制器
//!
//! 反复调用 agent（无参异步操作），用预先编译的 Schema 校验其产出：
//! - 第一次通过校验即返回，不再调用
//! - agent 报错与校验失败同样消耗一次尝试，只保留最近一次失败的诊断
//! - 尝试次数上限为 max_retries + 1，耗尽后返回 RetryError::BudgetExhausted
//!
//! 各次尝试严格串行；可选的截止时间作用于整个序列。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::core::{AttemptFailure, RetryError};
use crate::schema::{Schema, Validator};

pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// 重试策略：重试预算与可选的整体截止时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// 循环内可观察的状态；截止时间到达时据此报告
#[derive(Debug, Default)]
struct LoopState {
    attempts: u32,
    last: Option<AttemptFailure>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// 运行 agent 直到产出通过校验的值或预算耗尽
    ///
    /// Schema 在第一次尝试之前编译且只编译一次；编译失败直接返回 SchemaConfiguration，不调用 agent。
    pub async fn run<T, E, F, Fut, S>(&self, mut agent: F, schema: &S) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: Schema<T> + ?Sized,
    {
        let validator = schema.compile()?;
        let span = tracing::info_span!(
            "validated_retry",
            run_id = %Uuid::new_v4(),
            max_retries = self.max_retries
        );

        let mut state = LoopState::default();
        let attempts = self.attempt_loop(&mut agent, &validator, &mut state);

        match self.deadline {
            None => attempts.instrument(span).await,
            Some(deadline) => {
                let outcome = tokio::time::timeout(deadline, attempts.instrument(span.clone())).await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        span.in_scope(|| {
                            tracing::error!(
                                attempts = state.attempts,
                                "deadline of {:?} exceeded",
                                deadline
                            )
                        });
                        Err(RetryError::DeadlineExceeded {
                            deadline,
                            attempts: state.attempts,
                            last: state.last.take(),
                        })
                    }
                }
            }
        }
    }

    async fn attempt_loop<T, E, F, Fut, V>(
        &self,
        agent: &mut F,
        validator: &V,
        state: &mut LoopState,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        V: Validator<T>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt: u32 = 1;
        loop {
            state.attempts = attempt;

            let failure = match run_attempt(agent, validator).await {
                Ok(value) => {
                    tracing::debug!(attempt, "attempt produced a valid value");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            tracing::warn!(attempt, max_attempts, error = %failure, "attempt failed");

            if self.is_final_attempt(attempt) {
                tracing::error!(attempts = attempt, "retry budget exhausted");
                return Err(RetryError::BudgetExhausted {
                    max_retries: self.max_retries,
                    attempts: attempt,
                    last: failure,
                });
            }
            state.last = Some(failure);
            // 非最后一次时 attempt < max_attempts <= u32::MAX，不会溢出
            attempt += 1;
        }
    }

    /// 第 attempt 次（从 1 计）是否为最后一次；max_attempts 已饱和，u32::MAX 次即为上限
    fn is_final_attempt(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts()
    }
}

/// 单次尝试：调用 agent 并校验，结果显式标记为 Ok(值) 或 Err(诊断)
async fn run_attempt<T, E, F, Fut, V>(agent: &mut F, validator: &V) -> Result<T, AttemptFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    V: Validator<T>,
{
    let value = agent()
        .await
        .map_err(|e| AttemptFailure::Agent(e.to_string()))?;

    let outcome = validator.validate(&value);
    if outcome.is_valid() {
        Ok(value)
    } else {
        Err(AttemptFailure::Validation(outcome.into_errors()))
    }
}

/// `RetryPolicy::new(max_retries).run(agent, schema)` 的简写
pub async fn validated_retry<T, E, F, Fut, S>(
    agent: F,
    schema: &S,
    max_retries: u32,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    S: Schema<T> + ?Sized,
{
    RetryPolicy::new(max_retries).run(agent, schema).await
}

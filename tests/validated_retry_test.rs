//! 校验重试控制器集成测试：调用次数上限、短路、最近诊断优先、Schema 只编译一次

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use planwright::llm::{LlmClient, LlmError, ScriptedLlmClient};
use planwright::plan::extract_json;
use planwright::schema::{SchemaError, ValidationIssue, ValidationOutcome};
use planwright::{
    validated_retry, AttemptFailure, JsonSchema, RetryError, Schema, ShapeSchema, Validator,
};
use serde_json::{json, Value};

/// compile 时计数的 Schema：要求值为正整数
struct CountingSchema {
    compiles: AtomicUsize,
}

struct PositiveValidator;

impl Validator<i64> for PositiveValidator {
    fn validate(&self, value: &i64) -> ValidationOutcome {
        if *value > 0 {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid(vec![ValidationIssue::root(format!(
                "{value} is not positive"
            ))])
        }
    }
}

impl Schema<i64> for CountingSchema {
    type Validator = PositiveValidator;

    fn compile(&self) -> Result<PositiveValidator, SchemaError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        Ok(PositiveValidator)
    }
}

fn counting_schema() -> CountingSchema {
    CountingSchema {
        compiles: AtomicUsize::new(0),
    }
}

#[tokio::test]
async fn test_invocations_bounded_by_budget() {
    for max_retries in 0..5u32 {
        let calls = AtomicUsize::new(0);
        let schema = counting_schema();
        let err = validated_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<i64, String>(-1) }
            },
            &schema,
            max_retries,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), max_retries as usize + 1);
        assert_eq!(schema.compiles.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), max_retries + 1);
        assert!(err
            .to_string()
            .starts_with(&format!("Validation failed after {max_retries} retries: ")));
    }
}

#[tokio::test]
async fn test_valid_first_result_invokes_once() {
    let calls = AtomicUsize::new(0);
    let schema = counting_schema();
    let value = validated_retry(
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<i64, String>(7) }
        },
        &schema,
        10,
    )
    .await
    .unwrap();
    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(schema.compiles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_last_validation_errors_win() {
    let calls = AtomicUsize::new(0);
    let err = validated_retry(
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            async move { Ok::<i64, String>(-n) }
        },
        &counting_schema(),
        2,
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Validation failed after 2 retries: [{"path":"","message":"-3 is not positive"}]"#
    );
}

#[tokio::test]
async fn test_agent_errors_then_success() {
    let calls = AtomicUsize::new(0);
    let value = validated_retry(
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("transport failure on attempt {n}"))
                } else {
                    Ok(42i64)
                }
            }
        },
        &counting_schema(),
        2,
    )
    .await
    .unwrap();
    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_retries_fails_immediately() {
    let calls = AtomicUsize::new(0);
    let err = validated_retry(
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i64, _>("unauthorized") }
        },
        &counting_schema(),
        0,
    )
    .await
    .unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        err,
        RetryError::BudgetExhausted { max_retries: 0, attempts: 1, last: AttemptFailure::Agent(ref m) } if m == "unauthorized"
    ));
}

#[tokio::test]
async fn test_required_keys_example() {
    let replies = [json!({"a": 1}), json!({"a": 1, "b": 2})];
    let calls = AtomicUsize::new(0);
    let schema = ShapeSchema::new().require("a").require("b");
    let value = validated_retry(
        || {
            let reply = replies[calls.fetch_add(1, Ordering::SeqCst)].clone();
            async move { Ok::<Value, String>(reply) }
        },
        &schema,
        1,
    )
    .await
    .unwrap();
    assert_eq!(value, json!({"a": 1, "b": 2}));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_llm_backed_agent_with_json_schema() {
    let llm: Arc<ScriptedLlmClient> = Arc::new(ScriptedLlmClient::new(vec![
        Err(LlmError::Configuration("DEEPSEEK_API_KEY is not set".to_string())),
        Ok("Sure, here you go: {\"a\": \"one\"}".to_string()),
        Ok("```json\n{\"a\": 1, \"b\": 2}\n```".to_string()),
    ]));
    let schema = JsonSchema::from_value(json!({
        "type": "object",
        "required": ["a", "b"],
        "properties": { "a": { "type": "integer" } }
    }));

    let client = llm.clone();
    let value = validated_retry(
        move || {
            let client = client.clone();
            async move {
                let text = client.complete("plan please").await.map_err(|e| e.to_string())?;
                extract_json(&text)
            }
        },
        &schema,
        2,
    )
    .await
    .unwrap();
    assert_eq!(value, json!({"a": 1, "b": 2}));
    assert_eq!(llm.calls(), 3);
}

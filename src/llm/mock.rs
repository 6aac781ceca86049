//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - MockLlmClient：总是返回一份合法的示例项目计划 JSON
//! - ScriptedLlmClient：按顺序回放预设结果，并记录调用次数与收到的消息

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, Role};

/// Mock 客户端：把最后一条 User 消息的首行作为项目名，回一份固定结构的计划
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn complete_messages(&self, messages: &[Message]) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.lines().find(|l| !l.trim().is_empty()))
            .unwrap_or("(no input)");

        let plan = serde_json::json!({
            "project_name": last_user.trim(),
            "summary": "Mock plan generated without calling a model.",
            "phases": [
                {
                    "name": "Discovery",
                    "duration_weeks": 1,
                    "tasks": [
                        {
                            "title": "Clarify requirements",
                            "description": "Collect goals, constraints and acceptance criteria.",
                            "priority": "high"
                        }
                    ]
                },
                {
                    "name": "Delivery",
                    "duration_weeks": 2,
                    "tasks": [
                        {
                            "title": "Build first iteration",
                            "description": "Implement the smallest useful slice end to end."
                        }
                    ]
                }
            ],
            "risks": ["Requirements may change during delivery."]
        });
        Ok(format!("```json\n{plan:#}\n```"))
    }
}

/// 按脚本回放的客户端；脚本用完后返回 EmptyResponse
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// 全部成功回复的便捷构造
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 每次调用收到的消息列表
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete_messages(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(LlmError::EmptyResponse("Scripted".to_string())))
    }
}

//! 项目计划结构：LLM 产出经校验后反序列化为这些类型
//!
//! 同时派生 schemars::JsonSchema，默认的校验 Schema 与嵌入 prompt 的格式说明都由此生成。

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 任务优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// 阶段内的单个任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanTask {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// 计划阶段（按执行顺序排列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Phase {
    pub name: String,
    /// 预计持续周数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    pub tasks: Vec<PlanTask>,
}

/// 由项目描述生成的完整计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectPlan {
    pub project_name: String,
    pub summary: String,
    pub phases: Vec<Phase>,
    pub risks: Vec<String>,
}

impl ProjectPlan {
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    /// 各阶段周数之和（未给出周数的阶段不计）
    pub fn total_weeks(&self) -> u32 {
        self.phases.iter().filter_map(|p| p.duration_weeks).sum()
    }
}

/// 交给调用方的结果：计划本身 + 来源后端与生成时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub plan: ProjectPlan,
    pub provider: String,
    pub generated_at: DateTime<Utc>,
}

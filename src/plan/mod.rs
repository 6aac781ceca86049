//! 项目计划生成：描述 → LLM → JSON 提取 → Schema 校验（有界重试）→ ProjectPlan

pub mod extract;
pub mod generator;
pub mod types;

pub use extract::extract_json;
pub use generator::{PlanError, PlanGenerator};
pub use types::{Phase, PlanDocument, PlanTask, Priority, ProjectPlan};

//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PLANWRIGHT__*` 覆盖（双下划线表示嵌套，如 `PLANWRIGHT__LLM__PROVIDER=openai`）。
//! API Key 不进配置文件，只从 `OPENAI_API_KEY` / `DEEPSEEK_API_KEY` 读取。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{RetryPolicy, DEFAULT_MAX_RETRIES};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub retry: RetrySection,
    pub plan: PlanSection,
}

/// [llm] 段：后端选择、端点与超时
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    /// 覆盖 OpenAI 兼容端点（自建代理等）
    pub base_url: Option<String>,
    /// 单次请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            deepseek: LlmDeepSeekSection::default(),
            openai: LlmOpenAiSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

/// [retry] 段：重试预算与可选的整体截止时间
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub deadline_secs: Option<u64>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            deadline_secs: None,
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(self.max_retries);
        match self.deadline_secs {
            Some(secs) => policy.with_deadline(Duration::from_secs(secs)),
            None => policy,
        }
    }
}

/// [plan] 段：输出语言与可选的自定义 Schema 文件
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlanSection {
    #[serde(default = "default_language")]
    pub language: String,
    /// JSON Schema 文件；未设置时使用由 ProjectPlan 生成的 Schema
    pub schema_path: Option<PathBuf>,
}

impl Default for PlanSection {
    fn default() -> Self {
        Self {
            language: default_language(),
            schema_path: None,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// 从 config 目录加载配置，环境变量 PLANWRIGHT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（必须存在，可覆盖前面的键）
/// 3. 最后叠加环境变量 PLANWRIGHT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PLANWRIGHT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // 环境变量是进程级的：读写 PLANWRIGHT__* 的测试串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, "deepseek");
        assert_eq!(cfg.llm.timeout_secs, 60);
        assert_eq!(cfg.retry.max_retries, 2);
        assert_eq!(cfg.plan.language, "en");
        assert_eq!(cfg.retry.policy(), RetryPolicy::new(2));
    }

    #[test]
    fn test_load_explicit_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planwright.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "openai"

[llm.openai]
model = "gpt-4o"

[retry]
max_retries = 4
deadline_secs = 30
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.openai.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cfg.llm.timeout_secs, 60);
        assert_eq!(
            cfg.retry.policy(),
            RetryPolicy::new(4).with_deadline(Duration::from_secs(30))
        );
        assert_eq!(cfg.plan, PlanSection::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planwright.toml");
        std::fs::write(
            &path,
            r#"
[llm.deepseek]
model = "deepseek-chat"

[retry]
max_retries = 7
"#,
        )
        .unwrap();

        let vars = [
            ("PLANWRIGHT__RETRY__MAX_RETRIES", "4"),
            ("PLANWRIGHT__LLM__DEEPSEEK__MODEL", "deepseek-reasoner"),
            ("PLANWRIGHT__LLM__BASE_URL", "http://localhost:8080/v1"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let with_file = load_config(Some(path));
        let without_file = load_config(None);
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        for cfg in [with_file.unwrap(), without_file.unwrap()] {
            assert_eq!(cfg.retry.max_retries, 4);
            assert_eq!(cfg.llm.deepseek.model.as_deref(), Some("deepseek-reasoner"));
            assert_eq!(cfg.llm.base_url.as_deref(), Some("http://localhost:8080/v1"));
            assert_eq!(cfg.llm.provider, "deepseek");
        }
    }
}

//! Planwright 命令行入口
//!
//! planwright [--config <path>] [--max-retries <n>] [项目描述...]
//! 未给出描述时从 stdin 读取；成功时把 PlanDocument 以 JSON 打印到 stdout。

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use planwright::{
    config::load_config, llm::create_llm_from_config, observability, PlanGenerator, RetryPolicy,
};

/// 由项目描述生成经 Schema 校验的项目计划
#[derive(Debug, Parser)]
#[command(name = "planwright", version, about)]
struct CliArgs {
    /// 额外的 TOML 配置文件（覆盖 config/default.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖 [retry] max_retries
    #[arg(long)]
    max_retries: Option<u32>,

    /// 项目描述；省略时从 stdin 读取
    description: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    let args = CliArgs::parse();
    let cfg = load_config(args.config.clone()).context("Failed to load config")?;

    let description = if args.description.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read description from stdin")?;
        buf
    } else {
        args.description.join(" ")
    };

    let llm = create_llm_from_config(&cfg).context("Failed to create LLM client")?;
    let mut generator = PlanGenerator::from_config(llm, &cfg)?;
    if let Some(max_retries) = args.max_retries {
        let mut policy = RetryPolicy::new(max_retries);
        if let Some(deadline) = generator.policy().deadline() {
            policy = policy.with_deadline(deadline);
        }
        generator = generator.with_policy(policy);
    }

    let document = generator
        .generate(&description)
        .await
        .context("Plan generation failed")?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

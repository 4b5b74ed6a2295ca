//! Synthetic Vitals 主程序入口
//!
//! 合成页面与数据接口巡检工具

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use synthetic_vitals::cli::args::{Args, Commands, LogLevel};
use synthetic_vitals::cli::commands::{
    load_config, Command, InitCommand, RunCommand, ValidateCommand, VersionCommand,
};
use synthetic_vitals::config::Config;
use synthetic_vitals::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {:#}", e);
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 初始化日志系统
///
/// 命令行指定的级别优先，其次是检查表中的 `global.log_level`
fn setup_logging(args: &Args, config: Option<&Config>) -> Result<LoggingSystem> {
    let level = args
        .log_level
        .or_else(|| config.and_then(|c| LogLevel::parse(&c.global.log_level)))
        .unwrap_or(LogLevel::Info);

    let log_config = LogConfig {
        level: level.into(),
        file_path: args.log_file.clone(),
        console: args.log_file.is_none(),
        json_format: args.log_json,
        ..Default::default()
    };

    LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    match &args.command {
        Commands::Run { .. } => {
            let config_path: PathBuf = args.get_config_path();
            let config = load_config(&config_path)
                .await
                .with_context(|| format!("加载检查表失败: {}", config_path.display()))?;

            let logging = setup_logging(args, Some(&config))?;
            info!(
                "Synthetic Vitals v{} 启动, 检查表: {}",
                synthetic_vitals::VERSION,
                config_path.display()
            );

            RunCommand::new(config, logging).execute(args).await?;
        }
        Commands::Validate { .. } => {
            setup_logging(args, None)?;
            ValidateCommand.execute(args).await?;
        }
        Commands::Init { .. } => {
            setup_logging(args, None)?;
            InitCommand.execute(args).await?;
        }
        Commands::Version { .. } => {
            VersionCommand.execute(args).await?;
        }
    }

    Ok(())
}

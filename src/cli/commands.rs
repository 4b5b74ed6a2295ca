//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{CheckKind, Config, ConfigLoader, TomlConfigLoader};
use crate::error::{ConfigError, Result};
use crate::logging::LoggingSystem;
use crate::probe::{CheckDispatcher, HttpValidator, RunContext};
use crate::report::{ReportSender, StdoutSender, XymonSender};
use crate::runner::Runner;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 示例检查表
const SAMPLE_CONFIG: &str = include_str!("../../demos/checks.toml");

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载并验证检查表
pub async fn load_config(path: &Path) -> Result<Config> {
    let loader = TomlConfigLoader::new(true);
    loader.load_from_file(path).await
}

/// 运行命令
pub struct RunCommand {
    /// 已加载的检查表
    config: Config,
    /// 结构化日志句柄
    logging: LoggingSystem,
}

impl RunCommand {
    /// 创建运行命令
    pub fn new(config: Config, logging: LoggingSystem) -> Self {
        Self { config, logging }
    }

    /// 选择上报发送器
    fn sender(&self, dry_run: bool) -> Result<Arc<dyn ReportSender>> {
        if dry_run {
            Ok(Arc::new(StdoutSender))
        } else {
            Ok(Arc::new(XymonSender::from_env(&self.config.report)?))
        }
    }
}

#[async_trait]
impl Command for RunCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Run { dry_run, host } = &args.command else {
            return Ok(());
        };

        if let Some(name) = host {
            if !self.config.hosts.iter().any(|h| &h.name == name) {
                return Err(ConfigError::ValidationError(format!("未找到主机 '{}'", name)).into());
            }
        }

        let sender = self.sender(*dry_run)?;
        let validator = Arc::new(CheckDispatcher::new(
            HttpValidator::new()?,
            self.config.global.clone(),
        ));
        let runner = Runner::new(self.config.clone(), validator, sender)?
            .with_logging(self.logging.clone());

        let summary = runner.run(&mut RunContext::new(), host.as_deref()).await;

        info!(
            "运行 {} 结束: {}/{} 个检查通过, 上报 {} 成功 {} 失败",
            summary.run_id,
            summary.total_checks() - summary.failed_checks(),
            summary.total_checks(),
            summary.reports_sent,
            summary.reports_failed
        );

        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init { config_path, force } = &args.command {
            self.create_config_file(config_path, *force).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 写入示例检查表
    async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("检查表已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, SAMPLE_CONFIG).await?;

        println!("检查表已创建: {}", config_path.display());
        println!("运行前请设置 XYMON 和 XYMSRV 环境变量");

        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证检查表
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证检查表: {}", config_path.display());

        let config = load_config(config_path).await?;

        if verbose {
            println!("检查表验证通过！");
            println!("全局配置:");
            println!("  默认等待: {}秒", config.global.default_delay_seconds);
            println!("  日志级别: {}", config.global.log_level);
            println!(
                "  上报客户端: ${} ${}",
                config.report.client_env, config.report.server_env
            );

            println!("主机:");
            for (i, host) in config.hosts.iter().enumerate() {
                println!("  {}. {} ({:?})", i + 1, host.name, host.coordinate_policy);
                for check in &host.checks {
                    println!(
                        "     [{}] {} {} - {}",
                        check.column, check.kind, check.url, check.description
                    );
                }
            }
        } else {
            println!("✓ 检查表验证通过");
            println!(
                "✓ 找到 {} 个主机, {} 个检查",
                config.hosts.len(),
                config.check_count()
            );
            let pages = config
                .hosts
                .iter()
                .flat_map(|h| h.checks.iter())
                .filter(|c| c.kind == CheckKind::Page)
                .count();
            if pages > 0 {
                println!("✓ {} 个页面检查需要浏览器", pages);
            }
        }

        Ok(())
    }
}

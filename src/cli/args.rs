//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Synthetic Vitals - 合成页面与数据接口巡检工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "synthetic-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 检查表路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "检查表路径",
        env = "SYNTHETIC_VITALS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用检查表中的 `global.log_level`
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "SYNTHETIC_VITALS_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志")]
    pub log_json: bool,

    /// 日志文件路径（默认输出到标准错误）
    #[arg(long, value_name = "FILE", help = "日志文件路径")]
    pub log_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl LogLevel {
    /// 从检查表中的字符串解析
    pub fn parse(level: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(level, true).ok()
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 执行一次检查并上报
    Run {
        /// 只打印状态消息，不调用上报客户端
        #[arg(long, help = "只打印状态消息，不调用上报客户端")]
        dry_run: bool,

        /// 只检查指定主机
        #[arg(long, value_name = "NAME", help = "只检查指定主机")]
        host: Option<String>,
    },

    /// 验证检查表
    Validate {
        /// 检查表路径（可选，默认使用 --config）
        #[arg(value_name = "FILE", help = "检查表路径")]
        config_path: Option<PathBuf>,

        /// 显示每个主机的检查明细
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 生成示例检查表
    Init {
        /// 输出路径
        #[arg(value_name = "FILE", default_value = "checks.toml", help = "输出路径")]
        config_path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long, help = "覆盖已存在的文件")]
        force: bool,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl Args {
    /// 获取检查表路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let args = Args::try_parse_from(["synthetic-vitals", "run"]).unwrap();
        match args.command {
            Commands::Run { dry_run, host } => {
                assert!(!dry_run);
                assert!(host.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_run_with_options() {
        let args = Args::try_parse_from([
            "synthetic-vitals",
            "-c",
            "/etc/synthetic-vitals/checks.toml",
            "--log-level",
            "debug",
            "run",
            "--dry-run",
            "--host",
            "snap.uaf.edu",
        ])
        .unwrap();

        assert_eq!(
            args.get_config_path(),
            PathBuf::from("/etc/synthetic-vitals/checks.toml")
        );
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        match args.command {
            Commands::Run { dry_run, host } => {
                assert!(dry_run);
                assert_eq!(host.as_deref(), Some("snap.uaf.edu"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_default_path() {
        let args = Args::try_parse_from(["synthetic-vitals", "init"]).unwrap();
        match args.command {
            Commands::Init { config_path, force } => {
                assert_eq!(config_path, PathBuf::from("checks.toml"));
                assert!(!force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), None);
        assert_eq!(log::LevelFilter::from(LogLevel::Error), log::LevelFilter::Error);
    }
}

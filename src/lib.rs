//! Synthetic Vitals - 合成页面与数据接口巡检工具
//!
//! 按检查表逐个访问页面和数据接口，把每个主机每一列的结果汇总为
//! 红/绿状态，通过外部 Xymon 客户端上报：
//! - 渲染页面断言（无头 Chrome，支持点击后断言）
//! - JSON / CSV 数据接口校验
//! - 经纬度参数化的URL
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod probe;
pub mod report;
pub mod runner;

// 重新导出主要类型
pub use config::{CheckConfig, CheckKind, Config, HostConfig};
pub use error::SyntheticVitalsError;
pub use probe::{CheckDispatcher, CheckValidator, Color, HostBoard, RunContext};
pub use runner::{RunSummary, Runner};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

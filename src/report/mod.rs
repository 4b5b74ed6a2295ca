//! 状态上报模块
//!
//! 提供状态消息格式化和外部上报客户端调用

pub mod sender;
pub mod template;
pub mod xymon;

// 重新导出主要类型
pub use sender::{ReportSender, StdoutSender};
pub use template::{format_timestamp, StatusFormatter, StatusReport};
pub use xymon::XymonSender;

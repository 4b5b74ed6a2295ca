//! 状态上报发送器
//!
//! 定义上报接口和用于演练的标准输出实现

use crate::error::ReportError;
use crate::report::template::StatusReport;
use async_trait::async_trait;

/// 上报发送器trait
#[async_trait]
pub trait ReportSender: Send + Sync {
    /// 发送一条状态上报
    ///
    /// 发送是即发即弃的：调用方不关心上报客户端自身的退出状态
    async fn send(&self, report: &StatusReport) -> Result<(), ReportError>;
}

/// 把状态消息打印到标准输出（`run --dry-run`）
pub struct StdoutSender;

#[async_trait]
impl ReportSender for StdoutSender {
    async fn send(&self, report: &StatusReport) -> Result<(), ReportError> {
        println!("{}\n", report.message());
        Ok(())
    }
}

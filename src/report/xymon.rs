//! Xymon 上报客户端
//!
//! 以 `$XYMON $XYMSRV "<message>"` 的形式调用外部客户端

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::report::sender::ReportSender;
use crate::report::template::StatusReport;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// 调用外部上报客户端的发送器
#[derive(Debug, Clone)]
pub struct XymonSender {
    /// 上报客户端可执行文件
    client: PathBuf,
    /// 上报服务器地址
    server: String,
}

impl XymonSender {
    /// 创建发送器
    pub fn new(client: impl Into<PathBuf>, server: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
        }
    }

    /// 从上报配置指定的环境变量创建发送器
    pub fn from_env(config: &ReportConfig) -> Result<Self, ReportError> {
        let client = read_env(&config.client_env)?;
        let server = read_env(&config.server_env)?;
        Ok(Self::new(client, server))
    }

    /// 上报客户端路径
    pub fn client(&self) -> &PathBuf {
        &self.client
    }

    /// 上报服务器地址
    pub fn server(&self) -> &str {
        &self.server
    }
}

fn read_env(var: &str) -> Result<String, ReportError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ReportError::MissingEnv {
            var: var.to_string(),
        }),
    }
}

#[async_trait]
impl ReportSender for XymonSender {
    async fn send(&self, report: &StatusReport) -> Result<(), ReportError> {
        let status = Command::new(&self.client)
            .arg(&self.server)
            .arg(report.message())
            .status()
            .await
            .map_err(|e| ReportError::SpawnError(format!("{}: {}", self.client.display(), e)))?;

        // 客户端的退出状态不影响结果
        debug!("上报客户端退出: {} ({})", report.target(), status);
        Ok(())
    }
}

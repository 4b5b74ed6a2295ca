//! 检查分发器
//!
//! 按检查类型调用对应的校验器，并把所有失败折叠为 `false`

use crate::config::{CheckKind, GlobalConfig};
use crate::error::CheckError;
use crate::probe::http::HttpValidator;
use crate::probe::page::{check_page, BrowserSession};
use crate::probe::params::InstantiatedCheck;
use async_trait::async_trait;
use tracing::warn;

/// 检查校验器trait
#[async_trait]
pub trait CheckValidator: Send + Sync {
    /// 执行检查，保留失败原因
    ///
    /// # 参数
    /// * `check` - 已实例化的检查
    /// * `session` - 浏览器会话（页面检查需要）
    ///
    /// # 返回
    /// * `Result<bool, CheckError>` - 断言结果或失败原因
    async fn validate(
        &self,
        check: &InstantiatedCheck<'_>,
        session: Option<&dyn BrowserSession>,
    ) -> Result<bool, CheckError>;

    /// 执行检查并把任何错误折叠为 `false`
    ///
    /// 这是检查循环唯一使用的入口，错误只记录日志，不向上传播
    async fn run_check(
        &self,
        check: &InstantiatedCheck<'_>,
        session: Option<&dyn BrowserSession>,
    ) -> bool {
        match self.validate(check, session).await {
            Ok(passed) => passed,
            Err(e) => {
                warn!(
                    host = check.host,
                    column = check.column(),
                    url = %check.url,
                    "检查失败: {}",
                    e
                );
                false
            }
        }
    }
}

/// 默认分发器
pub struct CheckDispatcher {
    /// HTTP校验器
    http: HttpValidator,
    /// 全局配置（默认等待时间）
    global: GlobalConfig,
}

impl CheckDispatcher {
    /// 创建新的分发器
    pub fn new(http: HttpValidator, global: GlobalConfig) -> Self {
        Self { http, global }
    }
}

#[async_trait]
impl CheckValidator for CheckDispatcher {
    async fn validate(
        &self,
        check: &InstantiatedCheck<'_>,
        session: Option<&dyn BrowserSession>,
    ) -> Result<bool, CheckError> {
        match check.config.kind {
            CheckKind::Page => {
                let session = session
                    .ok_or_else(|| CheckError::Browser("浏览器会话未启动".to_string()))?;
                check_page(session, check, check.config.delay(&self.global)).await
            }
            CheckKind::Json => self.http.check_json(&check.url).await,
            CheckKind::Csv => self.http.check_csv(&check.url).await,
            CheckKind::Url => self.http.check_url(&check.url).await,
        }
    }
}

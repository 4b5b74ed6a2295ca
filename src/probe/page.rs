//! 渲染页面断言校验器
//!
//! 打开页面，等待异步内容加载，按需点击元素，最后在页面上下文中执行断言

use crate::error::CheckError;
use crate::probe::params::InstantiatedCheck;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// 浏览器会话trait
///
/// 运行期间只有一个会话，串行复用于所有页面检查
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到指定URL
    async fn navigate(&self, url: &str) -> Result<(), CheckError>;

    /// 滚动到元素并点击，`offset` 为相对可点击点的像素偏移
    async fn click(&self, selector: &str, offset: Option<[f64; 2]>) -> Result<(), CheckError>;

    /// 执行表达式并返回布尔结果
    async fn evaluate(&self, expression: &str) -> Result<bool, CheckError>;
}

/// 将 `return ...` 形式的断言包装为可求值的表达式
///
/// 结果按JavaScript真值转换：`1`、`"x"` 通过，`0`、`null`、`undefined` 失败
pub fn wrap_assertion(assertion: &str) -> String {
    format!("!!((() => {{ {} }})())", assertion)
}

/// 执行页面检查
///
/// 未配置点击时只等待一次；配置点击时在点击前后各等待一次
///
/// # 参数
/// * `session` - 浏览器会话
/// * `check` - 已实例化的检查
/// * `delay` - 每次等待的时长
pub async fn check_page(
    session: &dyn BrowserSession,
    check: &InstantiatedCheck<'_>,
    delay: Duration,
) -> Result<bool, CheckError> {
    let assertion = check
        .config
        .assertion
        .as_deref()
        .ok_or(CheckError::MissingAssertion)?;

    session.navigate(&check.url).await?;
    debug!("已打开 {}，等待 {:?}", check.url, delay);
    tokio::time::sleep(delay).await;

    if let Some(ref selector) = check.config.click_selector {
        session.click(selector, check.config.click_offset).await?;
        debug!("已点击 {}，等待 {:?}", selector, delay);
        tokio::time::sleep(delay).await;
    }

    session.evaluate(&wrap_assertion(assertion)).await
}

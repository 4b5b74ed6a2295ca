//! Chrome DevTools 浏览器会话
//!
//! 整个运行期间只启动一个浏览器、一个标签页，运行结束时显式关闭

use crate::config::BrowserConfig;
use crate::error::CheckError;
use crate::probe::page::BrowserSession;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 基于 chromiumoxide 的浏览器会话
pub struct ChromeSession {
    /// 浏览器进程
    browser: Mutex<Browser>,
    /// 复用的标签页
    page: Page,
    /// DevTools 事件处理任务
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// 启动浏览器并打开一个空白标签页
    pub async fn launch(config: &BrowserConfig) -> Result<Self, CheckError> {
        let mut builder =
            CdpBrowserConfig::builder().window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = config.executable {
            builder = builder.chrome_executable(executable);
        }
        let cdp_config = builder.build().map_err(CheckError::Browser)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| CheckError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools 事件循环结束: {}", e);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(CheckError::Browser(e.to_string()));
            }
        };

        info!("浏览器会话已启动 (headless: {})", config.headless);

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        {
            let browser = self.browser.get_mut();
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        if let Err(e) = (&mut self.handler).await {
            if !e.is_cancelled() {
                warn!("DevTools 事件任务异常退出: {}", e);
            }
        }
        info!("浏览器会话已关闭");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // 未走 close() 的退出路径；浏览器进程由 chromiumoxide 的 Drop 回收
        self.handler.abort();
    }
}

fn script_error(error: CdpError) -> CheckError {
    CheckError::Script(error.to_string())
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), CheckError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| CheckError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn click(&self, selector: &str, offset: Option<[f64; 2]>) -> Result<(), CheckError> {
        let element =
            self.page
                .find_element(selector)
                .await
                .map_err(|_| CheckError::ElementNotFound {
                    selector: selector.to_string(),
                })?;

        element.scroll_into_view().await.map_err(script_error)?;

        match offset {
            None => {
                element.click().await.map_err(script_error)?;
            }
            Some([dx, dy]) => {
                let point = element.clickable_point().await.map_err(script_error)?;
                self.page
                    .click(Point {
                        x: point.x + dx,
                        y: point.y + dy,
                    })
                    .await
                    .map_err(script_error)?;
            }
        }
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<bool, CheckError> {
        let result = self
            .page
            .evaluate_expression(expression)
            .await
            .map_err(script_error)?;

        result
            .into_value::<bool>()
            .map_err(|e| CheckError::NotBoolean(e.to_string()))
    }
}

//! HTTP 校验器
//!
//! 处理 json / csv / url 三类检查。所有类型都先要求状态码严格等于200，
//! 再检查响应体。重定向不会被跟随。

use crate::error::CheckError;
use reqwest::{redirect, Client, StatusCode};

/// HTTP 校验器
#[derive(Debug, Clone)]
pub struct HttpValidator {
    /// HTTP客户端
    client: Client,
}

impl HttpValidator {
    /// 创建新的HTTP校验器
    ///
    /// 超时沿用客户端默认值
    pub fn new() -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }

    /// 发起GET请求并要求状态码为200，返回响应体
    async fn fetch_ok(&self, url: &str) -> Result<Vec<u8>, CheckError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CheckError::Status {
                actual: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// url检查：状态码严格为200
    pub async fn check_url(&self, url: &str) -> Result<bool, CheckError> {
        let response = self.client.get(url).send().await?;
        Ok(response.status() == StatusCode::OK)
    }

    /// json检查：状态码200且响应体为合法JSON
    pub async fn check_json(&self, url: &str) -> Result<bool, CheckError> {
        let body = self.fetch_ok(url).await?;
        validate_json(&body)?;
        Ok(true)
    }

    /// csv检查：状态码200，去掉 `#` 注释行后能读出表头
    pub async fn check_csv(&self, url: &str) -> Result<bool, CheckError> {
        let body = self.fetch_ok(url).await?;
        let text = String::from_utf8_lossy(&body);
        validate_csv(&text)?;
        Ok(true)
    }
}

/// 校验JSON语法，不做结构校验
pub fn validate_json(body: &[u8]) -> Result<(), CheckError> {
    serde_json::from_slice::<serde_json::Value>(body)?;
    Ok(())
}

/// 去掉以 `#` 开头的注释行，统一换行符
pub fn strip_comment_lines(body: &str) -> String {
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 校验CSV：必须有非空表头，表头后第一行（如果存在）字段数必须一致
pub fn validate_csv(body: &str) -> Result<(), CheckError> {
    let data = strip_comment_lines(body);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?;
    if headers.is_empty() || headers.iter().all(|field| field.trim().is_empty()) {
        return Err(CheckError::EmptyCsv);
    }

    if let Some(record) = reader.records().next() {
        record?;
    }

    Ok(())
}

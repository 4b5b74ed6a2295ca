//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Synthetic Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum SyntheticVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 检查执行相关错误
    #[error("检查错误: {0}")]
    Check(#[from] CheckError),

    /// 状态上报相关错误
    #[error("上报错误: {0}")]
    Report(#[from] ReportError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 单个检查的失败原因
///
/// 这些错误只在检查循环内部流转，由 `CheckDispatcher::run_check`
/// 统一折叠为 `false`，永远不会向上传播。
#[derive(Error, Debug)]
pub enum CheckError {
    /// HTTP请求错误
    #[error("HTTP请求失败: {0}")]
    Request(#[from] reqwest::Error),

    /// 状态码不是200
    #[error("状态码不匹配: 期望 200, 实际 {actual}")]
    Status { actual: u16 },

    /// 响应体不是合法JSON
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 响应体不是合法CSV
    #[error("CSV解析失败: {0}")]
    Csv(#[from] csv::Error),

    /// 去掉注释行后没有表头
    #[error("CSV内容为空")]
    EmptyCsv,

    /// 页面导航失败
    #[error("页面导航失败: {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// 找不到需要点击的元素
    #[error("找不到元素: {selector}")]
    ElementNotFound { selector: String },

    /// 断言脚本执行失败
    #[error("脚本执行失败: {0}")]
    Script(String),

    /// 断言脚本没有返回布尔值
    #[error("断言结果不是布尔值: {0}")]
    NotBoolean(String),

    /// 浏览器会话不可用
    #[error("浏览器不可用: {0}")]
    Browser(String),

    /// 页面检查缺少断言
    #[error("页面检查缺少断言表达式")]
    MissingAssertion,
}

/// 状态上报错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    /// 必需的环境变量缺失
    #[error("缺少环境变量: {var}")]
    MissingEnv { var: String },

    /// 模板渲染错误
    #[error("模板渲染失败: {0}")]
    TemplateError(String),

    /// 上报客户端启动失败
    #[error("上报客户端启动失败: {0}")]
    SpawnError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, SyntheticVitalsError>;

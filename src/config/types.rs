//! 配置数据结构定义
//!
//! 定义检查表（主机 → 有序检查列表）的配置结构体和验证逻辑

use crate::probe::params::two_decimal_bounds;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// 主配置结构，包含全局配置、上报配置、浏览器配置和主机列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 状态上报配置
    #[serde(default)]
    pub report: ReportConfig,
    /// 浏览器配置
    #[serde(default)]
    pub browser: BrowserConfig,
    /// 主机列表，按声明顺序执行
    pub hosts: Vec<HostConfig>,
}

impl Config {
    /// 是否包含需要浏览器的页面检查
    pub fn needs_browser(&self) -> bool {
        self.hosts
            .iter()
            .flat_map(|host| host.checks.iter())
            .any(|check| check.kind == CheckKind::Page)
    }

    /// 检查总数
    pub fn check_count(&self) -> usize {
        self.hosts.iter().map(|host| host.checks.len()).sum()
    }
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 页面加载/点击后的默认等待时间（秒）
    #[serde(default = "default_delay")]
    pub default_delay_seconds: u64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_delay_seconds: default_delay(),
            log_level: default_log_level(),
        }
    }
}

/// 状态行前缀标记样式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// Xymon 内联图标，`&green` / `&red`
    Icon,
    /// 纯文本，`[PASS]` / `[FAIL]`
    Text,
}

impl MarkerStyle {
    /// 根据检查结果返回行前缀
    pub fn marker(&self, passed: bool) -> &'static str {
        match (self, passed) {
            (MarkerStyle::Icon, true) => "&green",
            (MarkerStyle::Icon, false) => "&red",
            (MarkerStyle::Text, true) => "[PASS]",
            (MarkerStyle::Text, false) => "[FAIL]",
        }
    }
}

/// 状态上报配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// 保存上报客户端路径的环境变量名
    #[serde(default = "default_client_env")]
    pub client_env: String,
    /// 保存上报服务器地址的环境变量名
    #[serde(default = "default_server_env")]
    pub server_env: String,
    /// 行前缀标记样式
    #[serde(default = "default_marker_style")]
    pub marker_style: MarkerStyle,
    /// 单行消息模板（handlebars），可用变量：marker、description、url、column
    #[serde(default = "default_line_template")]
    pub line_template: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            client_env: default_client_env(),
            server_env: default_server_env(),
            marker_style: default_marker_style(),
            line_template: default_line_template(),
        }
    }
}

/// 浏览器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserConfig {
    /// 是否无头运行
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chrome/Chromium 可执行文件路径，不指定则自动探测
    pub executable: Option<String>,
    /// 窗口宽度
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// 窗口高度
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

/// 坐标采样策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatePolicy {
    /// 每个检查独立采样
    #[default]
    PerCheck,
    /// 同一主机的所有检查共用一次采样
    PerHost,
}

/// 主机配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// 主机名，同时作为上报目标
    pub name: String,
    /// 坐标采样策略
    #[serde(default)]
    pub coordinate_policy: CoordinatePolicy,
    /// 检查列表，按声明顺序执行
    pub checks: Vec<CheckConfig>,
}

/// 检查类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// 渲染页面后执行JavaScript断言
    #[serde(alias = "javascript", alias = "rendered")]
    Page,
    /// 响应体必须是JSON
    Json,
    /// 响应体必须是CSV
    Csv,
    /// 只要求状态码为200
    Url,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Page => write!(f, "page"),
            CheckKind::Json => write!(f, "json"),
            CheckKind::Csv => write!(f, "csv"),
            CheckKind::Url => write!(f, "url"),
        }
    }
}

/// 单个检查配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckConfig {
    /// 上报列名
    pub column: String,
    /// 检查类型
    #[serde(rename = "type")]
    pub kind: CheckKind,
    /// 目标URL模板，可包含 `{lat}` / `{lon}`
    pub url: String,
    /// 描述模板，可包含 `{lat}` / `{lon}`
    pub description: String,
    /// 纬度采样区间
    pub lat_range: Option<[f64; 2]>,
    /// 经度采样区间
    pub lon_range: Option<[f64; 2]>,
    /// 加载后等待时间（秒），不指定则使用全局默认值
    pub delay_seconds: Option<u64>,
    /// 需要点击的元素选择器
    pub click_selector: Option<String>,
    /// 点击位置相对元素可点击点的像素偏移
    pub click_offset: Option<[f64; 2]>,
    /// 页面断言（函数体，使用 `return` 返回布尔值）
    pub assertion: Option<String>,
}

impl CheckConfig {
    /// 计算实际等待时间
    pub fn delay(&self, global: &GlobalConfig) -> Duration {
        Duration::from_secs(self.delay_seconds.unwrap_or(global.default_delay_seconds))
    }
}

// 默认值函数
fn default_delay() -> u64 {
    20
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_client_env() -> String {
    "XYMON".to_string()
}
fn default_server_env() -> String {
    "XYMSRV".to_string()
}
fn default_marker_style() -> MarkerStyle {
    MarkerStyle::Icon
}
fn default_line_template() -> String {
    "{{marker}} {{description}}".to_string()
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1366
}
fn default_window_height() -> u32 {
    900
}

/// 验证区间
fn validate_range(range: &[f64; 2], bound: f64, label: &str, owner: &str) -> Result<(), String> {
    let [min, max] = *range;
    if !min.is_finite() || !max.is_finite() {
        return Err(format!("{} 的{}区间包含无效数值", owner, label));
    }
    if min > max {
        return Err(format!(
            "{} 的{}区间无效: 下限 {} 大于上限 {}",
            owner, label, min, max
        ));
    }
    if min < -bound || max > bound {
        return Err(format!(
            "{} 的{}区间超出范围 [-{}, {}]",
            owner, label, bound, bound
        ));
    }
    if two_decimal_bounds(*range).is_none() {
        return Err(format!(
            "{} 的{}区间 [{}, {}] 内没有两位小数的取值",
            owner, label, min, max
        ));
    }
    Ok(())
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    // 验证日志级别
    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    // 验证上报配置
    if config.report.client_env.trim().is_empty() || config.report.server_env.trim().is_empty() {
        return Err("上报客户端和服务器的环境变量名不能为空".to_string());
    }

    if config.browser.window_width == 0 || config.browser.window_height == 0 {
        return Err("浏览器窗口尺寸不能为0".to_string());
    }

    if config.hosts.is_empty() {
        return Err("至少需要配置一个主机".to_string());
    }

    let mut seen_hosts = HashSet::new();
    for host in &config.hosts {
        if host.name.trim().is_empty() {
            return Err("主机名不能为空".to_string());
        }
        if !seen_hosts.insert(host.name.as_str()) {
            return Err(format!("主机 {} 重复定义", host.name));
        }
        if host.checks.is_empty() {
            return Err(format!("主机 {} 至少需要一个检查", host.name));
        }

        for (index, check) in host.checks.iter().enumerate() {
            let owner = format!("主机 {} 的第 {} 个检查", host.name, index + 1);

            // 列名会拼进 `host.column`，不能含空白或点号
            if check.column.is_empty()
                || !check
                    .column
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(format!("{} 的列名 '{}' 无效", owner, check.column));
            }

            if !check.url.starts_with("http://") && !check.url.starts_with("https://") {
                return Err(format!("{} 的URL格式无效", owner));
            }

            if check.description.trim().is_empty() {
                return Err(format!("{} 缺少描述", owner));
            }

            if let Some(ref range) = check.lat_range {
                validate_range(range, 90.0, "纬度", &owner)?;
            }
            if let Some(ref range) = check.lon_range {
                validate_range(range, 180.0, "经度", &owner)?;
            }

            match check.kind {
                CheckKind::Page => {
                    let has_assertion = check
                        .assertion
                        .as_deref()
                        .map(|a| !a.trim().is_empty())
                        .unwrap_or(false);
                    if !has_assertion {
                        return Err(format!("{} 是页面检查，必须指定断言", owner));
                    }
                    if check.click_offset.is_some() && check.click_selector.is_none() {
                        return Err(format!("{} 指定了点击偏移但没有点击选择器", owner));
                    }
                }
                _ => {
                    if check.click_selector.is_some() || check.click_offset.is_some() {
                        return Err(format!(
                            "{} 的类型为 {}，不支持点击操作",
                            owner, check.kind
                        ));
                    }
                    if check.assertion.is_some() {
                        return Err(format!(
                            "{} 的类型为 {}，不支持断言表达式",
                            owner, check.kind
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_check() -> CheckConfig {
        CheckConfig {
            column: "javascript".to_string(),
            kind: CheckKind::Page,
            url: "https://example.com/report".to_string(),
            description: "Temperature table values are not valid.".to_string(),
            lat_range: None,
            lon_range: None,
            delay_seconds: None,
            click_selector: None,
            click_offset: None,
            assertion: Some("return true".to_string()),
        }
    }

    fn create_test_config() -> Config {
        Config {
            global: GlobalConfig::default(),
            report: ReportConfig::default(),
            browser: BrowserConfig::default(),
            hosts: vec![HostConfig {
                name: "example.com".to_string(),
                coordinate_policy: CoordinatePolicy::PerCheck,
                checks: vec![create_test_check()],
            }],
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = create_test_config();

        let serialized = toml::to_string(&config).expect("序列化失败");
        assert!(!serialized.is_empty());

        let deserialized: Config = toml::from_str(&serialized).expect("反序列化失败");
        assert_eq!(config.hosts, deserialized.hosts);
        assert_eq!(config.report, deserialized.report);
    }

    #[test]
    fn test_config_validation() {
        let config = create_test_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_config_validation_empty_hosts() {
        let mut config = create_test_config();
        config.hosts.clear();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("至少需要配置一个主机"));
    }

    #[test]
    fn test_config_validation_duplicate_host() {
        let mut config = create_test_config();
        let host = config.hosts[0].clone();
        config.hosts.push(host);

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("重复定义"));
    }

    #[test]
    fn test_config_validation_invalid_url() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].url = "ftp://example.com".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("URL格式无效"));
    }

    #[test]
    fn test_config_validation_invalid_column() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].column = "java script".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("列名"));
    }

    #[test]
    fn test_config_validation_page_requires_assertion() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].assertion = Some("   ".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("必须指定断言"));
    }

    #[test]
    fn test_config_validation_click_on_non_page() {
        let mut config = create_test_config();
        let check = &mut config.hosts[0].checks[0];
        check.kind = CheckKind::Json;
        check.assertion = None;
        check.click_selector = Some("#button".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("不支持点击操作"));
    }

    #[test]
    fn test_config_validation_inverted_range() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].lat_range = Some([70.0, 60.0]);

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("纬度区间无效"));
    }

    #[test]
    fn test_config_validation_out_of_bounds_range() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].lon_range = Some([-200.0, -140.0]);

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("超出范围"));
    }

    #[test]
    fn test_config_validation_range_without_two_decimal_value() {
        let mut config = create_test_config();
        config.hosts[0].checks[0].lat_range = Some([1.001, 1.009]);
        config.hosts[0].checks[0].lon_range = Some([20.0, 21.0]);

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("没有两位小数"));

        config.hosts[0].checks[0].lat_range = Some([1.001, 1.01]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_default_values() {
        let global = GlobalConfig::default();
        assert_eq!(global.default_delay_seconds, 20);
        assert_eq!(global.log_level, "info");

        let report = ReportConfig::default();
        assert_eq!(report.client_env, "XYMON");
        assert_eq!(report.server_env, "XYMSRV");
        assert_eq!(report.marker_style, MarkerStyle::Icon);

        assert!(BrowserConfig::default().headless);
    }

    #[test]
    fn test_check_delay_fallback() {
        let global = GlobalConfig::default();
        let mut check = create_test_check();
        assert_eq!(check.delay(&global), Duration::from_secs(20));

        check.delay_seconds = Some(5);
        assert_eq!(check.delay(&global), Duration::from_secs(5));
    }

    #[test]
    fn test_check_kind_aliases() {
        let kind: CheckKind = serde_json::from_str("\"javascript\"").unwrap();
        assert_eq!(kind, CheckKind::Page);
        let kind: CheckKind = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(kind, CheckKind::Csv);
    }

    #[test]
    fn test_marker_style() {
        assert_eq!(MarkerStyle::Icon.marker(true), "&green");
        assert_eq!(MarkerStyle::Icon.marker(false), "&red");
        assert_eq!(MarkerStyle::Text.marker(true), "[PASS]");
        assert_eq!(MarkerStyle::Text.marker(false), "[FAIL]");
    }

    #[test]
    fn test_needs_browser() {
        let mut config = create_test_config();
        assert!(config.needs_browser());

        let check = &mut config.hosts[0].checks[0];
        check.kind = CheckKind::Url;
        check.assertion = None;
        assert!(!config.needs_browser());
        assert_eq!(config.check_count(), 1);
    }
}

//! 状态消息模板
//!
//! 把列结果格式化为 `status <host>.<column> <color> <timestamp>` 加消息行

use crate::config::{MarkerStyle, ReportConfig};
use crate::error::ReportError;
use crate::probe::{Color, ColumnResult};
use chrono::{DateTime, TimeZone};
use handlebars::Handlebars;
use serde_json::json;

const LINE_TEMPLATE: &str = "line";

/// 单个列的状态上报
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// 主机名
    pub host: String,
    /// 列名
    pub column: String,
    /// 颜色
    pub color: Color,
    /// 时间戳
    pub timestamp: String,
    /// 已渲染的消息行
    pub lines: Vec<String>,
}

impl StatusReport {
    /// 上报目标，`host.column`
    pub fn target(&self) -> String {
        format!("{}.{}", self.host, self.column)
    }

    /// 完整的状态消息
    pub fn message(&self) -> String {
        format!(
            "status {} {} {}\n{}",
            self.target(),
            self.color,
            self.timestamp,
            self.lines.join("\n")
        )
    }
}

/// 状态消息格式化器
pub struct StatusFormatter {
    /// 行模板引擎
    handlebars: Handlebars<'static>,
    /// 行前缀样式
    marker_style: MarkerStyle,
}

impl StatusFormatter {
    /// 根据上报配置创建格式化器
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let mut handlebars = Handlebars::new();
        // `&green` 之类的图标标记不能被HTML转义
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(LINE_TEMPLATE, &config.line_template)
            .map_err(|e| ReportError::TemplateError(e.to_string()))?;

        Ok(Self {
            handlebars,
            marker_style: config.marker_style,
        })
    }

    /// 格式化一个列的状态上报
    pub fn format<Tz>(
        &self,
        host: &str,
        column: &ColumnResult,
        now: &DateTime<Tz>,
    ) -> Result<StatusReport, ReportError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let lines = column
            .lines
            .iter()
            .map(|line| {
                let context = json!({
                    "marker": self.marker_style.marker(line.passed),
                    "status": if line.passed { "pass" } else { "fail" },
                    "description": line.description,
                    "url": line.url,
                    "column": column.column,
                });
                self.handlebars
                    .render(LINE_TEMPLATE, &context)
                    .map_err(|e| ReportError::TemplateError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatusReport {
            host: host.to_string(),
            column: column.column.clone(),
            color: column.color,
            timestamp: format_timestamp(now),
            lines,
        })
    }
}

/// 按 `date(1)` 的默认样式格式化时间
pub fn format_timestamp<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%a %b %e %H:%M:%S %Z %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CheckLine;
    use chrono::Utc;

    fn column() -> ColumnResult {
        let mut column = ColumnResult::new("javascript");
        column.record(CheckLine {
            passed: true,
            description: "Statewide daily tally graph is populated.".to_string(),
            url: "https://snap.uaf.edu/tools/daily-fire-tally".to_string(),
        });
        column.record(CheckLine {
            passed: false,
            description: "Daily tally by year graph is populated.".to_string(),
            url: "https://snap.uaf.edu/tools/daily-fire-tally".to_string(),
        });
        column
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&fixed_time()), "Sun Oct 18 09:05:03 UTC 2026");
    }

    #[test]
    fn test_icon_markers() {
        let formatter = StatusFormatter::new(&ReportConfig::default()).unwrap();
        let report = formatter
            .format("snap.uaf.edu", &column(), &fixed_time())
            .unwrap();

        assert_eq!(report.color, Color::Red);
        assert_eq!(
            report.message(),
            "status snap.uaf.edu.javascript red Sun Oct 18 09:05:03 UTC 2026\n\
             &green Statewide daily tally graph is populated.\n\
             &red Daily tally by year graph is populated."
        );
    }

    #[test]
    fn test_text_markers_and_custom_template() {
        let config = ReportConfig {
            marker_style: MarkerStyle::Text,
            line_template: "{{marker}} {{description}} ({{url}})".to_string(),
            ..ReportConfig::default()
        };
        let formatter = StatusFormatter::new(&config).unwrap();
        let report = formatter
            .format("snap.uaf.edu", &column(), &fixed_time())
            .unwrap();

        assert_eq!(report.lines.len(), 2);
        assert_eq!(
            report.lines[0],
            "[PASS] Statewide daily tally graph is populated. (https://snap.uaf.edu/tools/daily-fire-tally)"
        );
        assert!(report.lines[1].starts_with("[FAIL] "));
    }

    #[test]
    fn test_unknown_template_variable_is_rejected() {
        let config = ReportConfig {
            line_template: "{{marker}} {{nope}}".to_string(),
            ..ReportConfig::default()
        };
        let formatter = StatusFormatter::new(&config).unwrap();
        let result = formatter.format("snap.uaf.edu", &column(), &fixed_time());
        assert!(matches!(result, Err(ReportError::TemplateError(_))));
    }

    #[test]
    fn test_invalid_template_syntax() {
        let config = ReportConfig {
            line_template: "{{#if marker}}".to_string(),
            ..ReportConfig::default()
        };
        assert!(StatusFormatter::new(&config).is_err());
    }
}

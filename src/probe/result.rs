//! 检查结果聚合
//!
//! 按 (主机, 列) 汇总检查结果：颜色和有序的消息行

use serde::{Deserialize, Serialize};

/// 列状态颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// 所有检查通过
    Green,
    /// 至少一个检查失败
    Red,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Green => write!(f, "green"),
            Color::Red => write!(f, "red"),
        }
    }
}

/// 单个检查在列消息中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckLine {
    /// 是否通过
    pub passed: bool,
    /// 检查描述（已实例化）
    pub description: String,
    /// 检查URL（已实例化）
    pub url: String,
}

/// 一个列的聚合结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnResult {
    /// 列名
    pub column: String,
    /// 列颜色
    pub color: Color,
    /// 按执行顺序排列的消息行
    pub lines: Vec<CheckLine>,
}

impl ColumnResult {
    /// 创建空的列结果，初始为绿色
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            color: Color::Green,
            lines: Vec::new(),
        }
    }

    /// 记录一个检查结果
    pub fn record(&mut self, line: CheckLine) {
        if !line.passed {
            self.color = Color::Red;
        }
        self.lines.push(line);
    }

    /// 失败的检查数
    pub fn failures(&self) -> usize {
        self.lines.iter().filter(|line| !line.passed).count()
    }
}

/// 单个主机的结果面板，列按首次出现的顺序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostBoard {
    /// 主机名
    pub host: String,
    /// 列结果
    pub columns: Vec<ColumnResult>,
}

impl HostBoard {
    /// 创建空面板
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            columns: Vec::new(),
        }
    }

    /// 将检查结果写入对应列
    pub fn record(&mut self, column: &str, line: CheckLine) {
        match self.columns.iter_mut().find(|c| c.column == column) {
            Some(existing) => existing.record(line),
            None => {
                let mut result = ColumnResult::new(column);
                result.record(line);
                self.columns.push(result);
            }
        }
    }

    /// 查找列
    pub fn column(&self, column: &str) -> Option<&ColumnResult> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// 是否存在红色列
    pub fn has_failures(&self) -> bool {
        self.columns.iter().any(|c| c.color == Color::Red)
    }
}

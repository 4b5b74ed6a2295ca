//! 检查执行模块
//!
//! 提供坐标参数化、检查分发、四类校验器和结果聚合

pub mod browser;
pub mod checker;
pub mod http;
pub mod page;
pub mod params;
pub mod result;

// 重新导出主要类型
pub use browser::ChromeSession;
pub use checker::{CheckDispatcher, CheckValidator};
pub use http::HttpValidator;
pub use page::BrowserSession;
pub use params::{Coordinate, InstantiatedCheck, RunContext};
pub use result::{CheckLine, Color, ColumnResult, HostBoard};

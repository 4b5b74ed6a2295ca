//! 检查运行器
//!
//! 按声明顺序逐个主机、逐个检查串行执行，汇总到列后上报

use crate::config::{CheckKind, Config, HostConfig};
use crate::error::Result;
use crate::logging::LoggingSystem;
use crate::probe::{
    BrowserSession, CheckLine, CheckValidator, ChromeSession, Color, HostBoard, RunContext,
};
use crate::report::{ReportSender, StatusFormatter};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// 一次运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 运行ID
    pub run_id: Uuid,
    /// 各主机的结果面板
    pub boards: Vec<HostBoard>,
    /// 成功交给上报客户端的状态数
    pub reports_sent: usize,
    /// 上报失败的状态数
    pub reports_failed: usize,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            boards: Vec::new(),
            reports_sent: 0,
            reports_failed: 0,
        }
    }

    /// 执行的检查总数
    pub fn total_checks(&self) -> usize {
        self.boards
            .iter()
            .flat_map(|board| board.columns.iter())
            .map(|column| column.lines.len())
            .sum()
    }

    /// 失败的检查数
    pub fn failed_checks(&self) -> usize {
        self.boards
            .iter()
            .flat_map(|board| board.columns.iter())
            .map(|column| column.failures())
            .sum()
    }

    /// 红色列数
    pub fn red_columns(&self) -> usize {
        self.boards
            .iter()
            .flat_map(|board| board.columns.iter())
            .filter(|column| column.color == Color::Red)
            .count()
    }
}

/// 检查运行器
pub struct Runner {
    /// 检查表
    config: Config,
    /// 检查校验器
    validator: Arc<dyn CheckValidator>,
    /// 状态消息格式化器
    formatter: StatusFormatter,
    /// 上报发送器
    sender: Arc<dyn ReportSender>,
    /// 结构化日志
    logging: LoggingSystem,
}

impl Runner {
    /// 创建运行器
    ///
    /// # 参数
    /// * `config` - 已验证的检查表
    /// * `validator` - 检查校验器
    /// * `sender` - 上报发送器
    pub fn new(
        config: Config,
        validator: Arc<dyn CheckValidator>,
        sender: Arc<dyn ReportSender>,
    ) -> Result<Self> {
        let formatter = StatusFormatter::new(&config.report)?;
        Ok(Self {
            config,
            validator,
            formatter,
            sender,
            logging: LoggingSystem::default(),
        })
    }

    /// 替换结构化日志句柄
    pub fn with_logging(mut self, logging: LoggingSystem) -> Self {
        self.logging = logging;
        self
    }

    /// 按主机过滤
    fn selected_hosts<'a>(
        &'a self,
        host_filter: Option<&'a str>,
    ) -> impl Iterator<Item = &'a HostConfig> + 'a {
        self.config
            .hosts
            .iter()
            .filter(move |host| host_filter.map_or(true, |name| host.name == name))
    }

    /// 执行一次完整运行
    ///
    /// 只有选中的主机包含页面检查时才启动浏览器；浏览器在运行结束时关闭。
    /// 启动失败时所有页面检查记为失败，其余检查照常执行。
    pub async fn run(&self, context: &mut RunContext, host_filter: Option<&str>) -> RunSummary {
        let needs_browser = self
            .selected_hosts(host_filter)
            .flat_map(|host| host.checks.iter())
            .any(|check| check.kind == CheckKind::Page);

        let session = if needs_browser {
            match ChromeSession::launch(&self.config.browser).await {
                Ok(session) => Some(session),
                Err(e) => {
                    error!("浏览器启动失败，页面检查将全部失败: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let summary = self
            .run_with_session(
                context,
                host_filter,
                session.as_ref().map(|s| s as &dyn BrowserSession),
            )
            .await;

        if let Some(session) = session {
            session.close().await;
        }

        summary
    }

    /// 使用给定的浏览器会话执行运行
    pub async fn run_with_session(
        &self,
        context: &mut RunContext,
        host_filter: Option<&str>,
        session: Option<&dyn BrowserSession>,
    ) -> RunSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);

        async move {
            let mut summary = RunSummary::new(run_id);
            info!("开始运行检查");

            for host in self.selected_hosts(host_filter) {
                let board = self.run_host(host, context, session).await;
                let (sent, failed) = self.report_host(&board).await;
                summary.reports_sent += sent;
                summary.reports_failed += failed;
                summary.boards.push(board);
            }

            info!(
                "运行完成: {} 个检查, {} 个失败, {} 个红色列",
                summary.total_checks(),
                summary.failed_checks(),
                summary.red_columns()
            );
            summary
        }
        .instrument(span)
        .await
    }

    /// 执行单个主机的所有检查
    async fn run_host(
        &self,
        host: &HostConfig,
        context: &mut RunContext,
        session: Option<&dyn BrowserSession>,
    ) -> HostBoard {
        let mut board = HostBoard::new(&host.name);

        for check in &host.checks {
            let instantiated = context.instantiate(host, check);
            let started = Instant::now();
            let passed = self.validator.run_check(&instantiated, session).await;

            self.logging.check_log(
                &host.name,
                &check.column,
                &instantiated.description,
                passed,
                started.elapsed().as_millis() as u64,
            );

            board.record(
                &check.column,
                CheckLine {
                    passed,
                    description: instantiated.description,
                    url: instantiated.url,
                },
            );
        }

        board
    }

    /// 为主机的每一列发送一条状态，返回 (成功数, 失败数)
    async fn report_host(&self, board: &HostBoard) -> (usize, usize) {
        let now = Local::now();
        let mut sent = 0;
        let mut failed = 0;

        for column in &board.columns {
            let target = format!("{}.{}", board.host, column.column);
            let color = column.color.to_string();

            let outcome = match self.formatter.format(&board.host, column, &now) {
                Ok(report) => self.sender.send(&report).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    sent += 1;
                    self.logging.report_log(&target, &color, true, None);
                }
                Err(e) => {
                    failed += 1;
                    self.logging
                        .report_log(&target, &color, false, Some(&e.to_string()));
                }
            }
        }

        (sent, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserConfig, CheckConfig, CoordinatePolicy, GlobalConfig, ReportConfig};
    use crate::error::{CheckError, ReportError};
    use crate::probe::InstantiatedCheck;
    use crate::report::StatusReport;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 按URL决定结果的校验器，`err` 开头的URL返回错误
    struct UrlValidator;

    #[async_trait]
    impl CheckValidator for UrlValidator {
        async fn validate(
            &self,
            check: &InstantiatedCheck<'_>,
            _session: Option<&dyn BrowserSession>,
        ) -> std::result::Result<bool, CheckError> {
            if check.url.contains("/err") {
                return Err(CheckError::Script("boom".to_string()));
            }
            Ok(check.url.contains("/pass"))
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        reports: Mutex<Vec<StatusReport>>,
    }

    #[async_trait]
    impl ReportSender for RecordingSender {
        async fn send(&self, report: &StatusReport) -> std::result::Result<(), ReportError> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn check(column: &str, path: &str) -> CheckConfig {
        CheckConfig {
            column: column.to_string(),
            kind: CheckKind::Url,
            url: format!("https://example.com{}", path),
            description: format!("check {}", path),
            lat_range: None,
            lon_range: None,
            delay_seconds: None,
            click_selector: None,
            click_offset: None,
            assertion: None,
        }
    }

    fn config(hosts: Vec<(&str, Vec<CheckConfig>)>) -> Config {
        Config {
            global: GlobalConfig::default(),
            report: ReportConfig::default(),
            browser: BrowserConfig::default(),
            hosts: hosts
                .into_iter()
                .map(|(name, checks)| HostConfig {
                    name: name.to_string(),
                    coordinate_policy: CoordinatePolicy::PerCheck,
                    checks,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_errors_are_contained_and_columns_reported() {
        let config = config(vec![
            (
                "a.example.com",
                vec![
                    check("web", "/pass1"),
                    check("api", "/err1"),
                    check("web", "/fail1"),
                    check("api", "/pass2"),
                ],
            ),
            ("b.example.com", vec![check("web", "/pass3")]),
        ]);
        let sender = Arc::new(RecordingSender::default());
        let runner = Runner::new(config, Arc::new(UrlValidator), sender.clone()).unwrap();

        let summary = runner
            .run_with_session(&mut RunContext::seeded(1), None, None)
            .await;

        assert_eq!(summary.total_checks(), 5);
        assert_eq!(summary.failed_checks(), 2);
        assert_eq!(summary.reports_sent, 3);
        assert_eq!(summary.reports_failed, 0);

        let reports = sender.reports.lock().unwrap();
        let targets: Vec<_> = reports.iter().map(|r| r.target()).collect();
        assert_eq!(
            targets,
            vec!["a.example.com.web", "a.example.com.api", "b.example.com.web"]
        );
        assert_eq!(reports[0].color, Color::Red);
        assert_eq!(
            reports[0].lines,
            vec!["&green check /pass1", "&red check /fail1"]
        );
        assert_eq!(reports[1].color, Color::Red);
        assert_eq!(reports[1].lines, vec!["&red check /err1", "&green check /pass2"]);
        assert_eq!(reports[2].color, Color::Green);
    }

    #[tokio::test]
    async fn test_host_filter() {
        let config = config(vec![
            ("a.example.com", vec![check("web", "/pass1")]),
            ("b.example.com", vec![check("web", "/fail1")]),
        ]);
        let sender = Arc::new(RecordingSender::default());
        let runner = Runner::new(config, Arc::new(UrlValidator), sender.clone()).unwrap();

        let summary = runner
            .run(&mut RunContext::seeded(1), Some("b.example.com"))
            .await;

        assert_eq!(summary.boards.len(), 1);
        assert_eq!(summary.boards[0].host, "b.example.com");
        assert_eq!(summary.red_columns(), 1);
        assert_eq!(
            summary.boards[0].column("web").map(|c| c.color),
            Some(Color::Red)
        );
        assert_eq!(sender.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_report_failure_is_counted_not_propagated() {
        struct FailingSender;

        #[async_trait]
        impl ReportSender for FailingSender {
            async fn send(&self, _report: &StatusReport) -> std::result::Result<(), ReportError> {
                Err(ReportError::SpawnError("no such file".to_string()))
            }
        }

        let config = config(vec![(
            "a.example.com",
            vec![check("web", "/pass1"), check("api", "/pass2")],
        )]);
        let runner = Runner::new(config, Arc::new(UrlValidator), Arc::new(FailingSender)).unwrap();

        let summary = runner
            .run_with_session(&mut RunContext::seeded(1), None, None)
            .await;

        assert_eq!(summary.reports_sent, 0);
        assert_eq!(summary.reports_failed, 2);
        assert_eq!(summary.failed_checks(), 0);
    }
}

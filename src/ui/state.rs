//! App 状态定义 (Model)
//!
//! 控制器的全部状态都在一个 `App` 值里

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::warn;

use super::discovery::DiscoveryCoordinator;
use super::selection::SelectionList;
use super::status::StatusReporter;
use crate::models::{JobRecord, PrinterRecord};
use crate::print_system::PrintSystem;

/// 顶层视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// 打印机面板在上，作业面板在下
    Main,
    Discover,
}

/// 主视图中持有焦点的面板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Printers,
    Jobs,
}

/// 等待确认的破坏性操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    ConfirmDelete { printer: String },
    ConfirmCancelJob { job_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub kind: ModalKind,
    pub message: String,
}

impl Modal {
    pub fn confirm_delete(printer: &PrinterRecord) -> Self {
        Self {
            kind: ModalKind::ConfirmDelete {
                printer: printer.name.clone(),
            },
            message: format!("Delete printer '{}'?", printer.name),
        }
    }

    pub fn confirm_cancel_job(job: &JobRecord) -> Self {
        Self {
            kind: ModalKind::ConfirmCancelJob { job_id: job.id },
            message: format!("Cancel job {} '{}'?", job.id, job.title),
        }
    }
}

pub struct App {
    pub view: View,
    pub panel: Panel,
    pub printers: SelectionList<PrinterRecord>,
    pub jobs: SelectionList<JobRecord>,
    pub discovery: DiscoveryCoordinator,
    pub modal: Option<Modal>,
    pub status: StatusReporter,
    pub running: bool,
    pub last_refresh: Option<DateTime<Local>>,
    /// 结果已写入状态栏的发现代数
    pub(super) reported_generation: Option<u64>,
    pub(super) backend: Arc<dyn PrintSystem>,
}

impl App {
    /// 创建应用实例并加载一次两个列表
    pub fn new(backend: Arc<dyn PrintSystem>) -> Self {
        let mut app = Self {
            view: View::Main,
            panel: Panel::Printers,
            printers: SelectionList::new(),
            jobs: SelectionList::new(),
            discovery: DiscoveryCoordinator::new(Arc::clone(&backend)),
            modal: None,
            status: StatusReporter::default(),
            running: true,
            last_refresh: None,
            reported_generation: None,
            backend,
        };
        if let Err(message) = app.reload_all() {
            warn!(%message, "initial load failed");
            app.status.set(message);
        }
        app
    }

    /// 退出：让仍在运行的发现结果失效
    pub fn shutdown(&mut self) {
        self.discovery.invalidate();
        self.running = false;
    }
}

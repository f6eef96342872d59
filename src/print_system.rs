//! 打印系统接口
//!
//! 控制器对本地打印系统的全部需求。调用都是同步的，只有 `discover` 可能很慢。

use std::io;

use thiserror::Error;

use crate::models::{DiscoveredDevice, JobRecord, PrinterRecord};

#[derive(Debug, Error)]
pub enum PrintSystemError {
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected output from `{command}`: {line}")]
    Parse { command: String, line: String },
}

pub type Result<T> = std::result::Result<T, PrintSystemError>;

/// 打印系统提供的操作
pub trait PrintSystem: Send + Sync {
    fn list_printers(&self) -> Result<Vec<PrinterRecord>>;

    /// 只包含活动作业
    fn list_jobs(&self) -> Result<Vec<JobRecord>>;

    fn set_default(&self, name: &str) -> Result<()>;

    fn delete_printer(&self, name: &str) -> Result<()>;

    fn cancel_job(&self, id: u32) -> Result<()>;

    /// 阻塞的网络扫描，可能需要数秒
    fn discover(&self) -> Result<Vec<DiscoveredDevice>>;

    fn add_printer(&self, name: &str, uri: &str) -> Result<()>;
}

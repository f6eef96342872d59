use std::fmt;

/// 打印队列状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrinterState {
    Idle,
    Processing,
    Stopped,
    #[default]
    Unknown,
}

impl PrinterState {
    /// 解析 `lpstat -p` 输出中的状态词
    pub fn from_lpstat(word: &str) -> Self {
        match word.trim_end_matches('.').to_ascii_lowercase().as_str() {
            "idle" => PrinterState::Idle,
            "printing" | "processing" | "now" => PrinterState::Processing,
            "disabled" | "stopped" => PrinterState::Stopped,
            _ => PrinterState::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrinterState::Idle => "idle",
            PrinterState::Processing => "printing",
            PrinterState::Stopped => "stopped",
            PrinterState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// 作业状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Completed,
    #[default]
    Unknown,
}

impl JobState {
    /// 根据 `lpstat -l -o` 中 `Alerts:` 行的 job-state-reasons 关键字映射
    pub fn from_reasons(reasons: &str) -> Self {
        let has = |needle: &str| reasons.split_whitespace().any(|r| r.contains(needle));
        if has("hold") {
            JobState::Held
        } else if has("canceled") {
            JobState::Canceled
        } else if has("aborted") {
            JobState::Aborted
        } else if has("completed") {
            JobState::Completed
        } else if has("stop") {
            JobState::Stopped
        } else if has("printing") || has("transforming") {
            JobState::Processing
        } else if has("incoming") || has("none") || has("queued") {
            JobState::Pending
        } else {
            JobState::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Held => "held",
            JobState::Processing => "printing",
            JobState::Stopped => "stopped",
            JobState::Canceled => "canceled",
            JobState::Aborted => "aborted",
            JobState::Completed => "completed",
            JobState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// 已配置的打印队列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterRecord {
    pub name: String,
    /// 型号 (printer-make-and-model)，取不到时退回描述文字
    pub model: String,
    pub location: String,
    pub state: PrinterState,
    pub is_default: bool,
    pub accepting_jobs: bool,
}

impl PrinterRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: String::new(),
            location: String::new(),
            state: PrinterState::Unknown,
            is_default: false,
            accepting_jobs: true,
        }
    }
}

/// 活动的打印作业
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: u32,
    pub printer: String,
    pub title: String,
    pub user: String,
    /// 字节数
    pub size: u64,
    pub state: JobState,
}

/// 发现到的网络设备，尚未添加为队列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub uri: String,
    pub suggested_name: String,
}

impl DiscoveredDevice {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let suggested_name = suggest_queue_name(&uri);
        Self {
            uri,
            suggested_name,
        }
    }

    /// URI 协议，如 `ipp://host/...` 的 `ipp`
    pub fn scheme(&self) -> &str {
        self.uri.split_once("://").map(|(s, _)| s).unwrap_or("")
    }
}

/// 由设备 URI 的主机部分生成队列名
///
/// 保留字母、数字和 `.` `_` `-`，其余字符（包括 IPv6 的 `:`）替换为 `_`。
fn suggest_queue_name(uri: &str) -> String {
    let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
    let host = rest.split('/').next().unwrap_or(rest);
    let host = match host.rsplit_once(':') {
        // 不带端口的 IPv6 字面量保持原样
        Some((h, port)) if port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    let name: String = host
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "printer".to_string()
    } else {
        name
    }
}

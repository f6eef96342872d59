use tracing::info;

/// 底部的单行临时状态
#[derive(Debug, Default, Clone)]
pub struct StatusReporter {
    message: String,
}

impl StatusReporter {
    /// 覆盖当前消息
    pub fn set(&mut self, message: impl Into<String>) {
        self.message = message.into();
        info!(status = %self.message);
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// 用户配置 (~/.config/spoolie/config.toml)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// 主循环等待输入的最长时间（毫秒）
    pub tick_ms: u64,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// 发现结果保留的 URI 协议
    pub discovery_schemes: Vec<String>,
    /// 使用 IPP Everywhere 驱动添加的协议
    pub everywhere_schemes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            log_level: "info".to_string(),
            log_dir: None,
            discovery_schemes: vec!["socket".into(), "ipp".into(), "ipps".into()],
            everywhere_schemes: vec!["ipp".into(), "ipps".into()],
        }
    }
}

impl Config {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("spoolie").join("config.toml"))
    }

    /// 从 TOML 文件加载；文件不存在时使用默认值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    /// 日志目录，不存在时创建
    pub fn log_dir(&self) -> io::Result<PathBuf> {
        let dir = match &self.log_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no user data directory"))?
                .join("spoolie"),
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::playback::WatchdogSettings;
use crate::application::ports::PlaybackPreferences;
use crate::domain::voice::{VoiceQuality, VoiceSelector};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 合成与产物配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 停滞看门狗配置
    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 偏好存储配置
    #[serde(default)]
    pub settings: SettingsConfig,

    /// 音色偏好配置
    #[serde(default)]
    pub voices: VoicesConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 临时音频产物目录
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// 状态机命令通道容量
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("tingwen")
}

fn default_command_capacity() -> usize {
    32
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            command_capacity: default_command_capacity(),
        }
    }
}

/// 看门狗配置
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    /// 没有新缓冲的最长时间（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 检查间隔（秒）
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl WatchdogConfig {
    pub fn settings(&self) -> WatchdogSettings {
        WatchdogSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 没有保存的偏好时使用的速率
    #[serde(default = "default_rate")]
    pub default_rate: f32,

    /// 没有保存的偏好时是否自动连播
    #[serde(default)]
    pub auto_advance: bool,

    /// 媒体面板进度刷新间隔（毫秒）
    #[serde(default = "default_now_playing_refresh_ms")]
    pub now_playing_refresh_ms: u64,
}

fn default_rate() -> f32 {
    1.0
}

fn default_now_playing_refresh_ms() -> u64 {
    1000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_rate: default_rate(),
            auto_advance: false,
            now_playing_refresh_ms: default_now_playing_refresh_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn default_preferences(&self) -> PlaybackPreferences {
        PlaybackPreferences {
            auto_advance_enabled: self.auto_advance,
            playback_rate: self.default_rate,
        }
    }

    pub fn now_playing_refresh(&self) -> Duration {
        Duration::from_millis(self.now_playing_refresh_ms)
    }
}

/// 偏好存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// 偏好 JSON 文件路径
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("data/preferences.json")
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// 音色偏好配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoicesConfig {
    /// 质量偏好顺序，靠前的优先
    #[serde(default = "default_quality_order")]
    pub quality_order: Vec<String>,
}

fn default_quality_order() -> Vec<String> {
    vec![
        "premium".to_string(),
        "enhanced".to_string(),
        "default".to_string(),
    ]
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            quality_order: default_quality_order(),
        }
    }
}

impl VoicesConfig {
    /// 解析质量顺序，遇到未知名称返回它
    pub fn qualities(&self) -> Result<Vec<VoiceQuality>, String> {
        self.quality_order
            .iter()
            .map(|name| name.parse::<VoiceQuality>().map_err(|_| name.clone()))
            .collect()
    }

    pub fn selector(&self) -> VoiceSelector {
        VoiceSelector::new(self.qualities().unwrap_or_default())
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

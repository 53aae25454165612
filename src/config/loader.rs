//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::playback::PlaybackRate;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `TINGWEN_WATCHDOG__TIMEOUT_SECS=20`
/// - `TINGWEN_PLAYBACK__DEFAULT_RATE=1.25`
/// - `TINGWEN_SYNTHESIS__ARTIFACT_DIR=/tmp/tingwen`
/// - `TINGWEN_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("synthesis.command_capacity", 32)?
        .set_default("watchdog.timeout_secs", 15)?
        .set_default("watchdog.poll_interval_secs", 5)?
        .set_default("playback.default_rate", 1.0)?
        .set_default("playback.auto_advance", false)?
        .set_default("playback.now_playing_refresh_ms", 1000)?
        .set_default("settings.path", "data/preferences.json")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: TINGWEN_，层级分隔符: __
    builder = builder.add_source(
        Environment::with_prefix("TINGWEN")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.synthesis.artifact_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Artifact directory cannot be empty".to_string(),
        ));
    }

    if config.synthesis.command_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Command channel capacity cannot be 0".to_string(),
        ));
    }

    if config.watchdog.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Watchdog poll interval cannot be 0".to_string(),
        ));
    }

    if config.watchdog.timeout_secs <= config.watchdog.poll_interval_secs {
        return Err(ConfigError::ValidationError(format!(
            "Watchdog timeout ({}s) must exceed poll interval ({}s)",
            config.watchdog.timeout_secs, config.watchdog.poll_interval_secs
        )));
    }

    let rate = config.playback.default_rate;
    if !(PlaybackRate::MIN..=PlaybackRate::MAX).contains(&rate) {
        return Err(ConfigError::ValidationError(format!(
            "Default rate {} outside [{}, {}]",
            rate,
            PlaybackRate::MIN,
            PlaybackRate::MAX
        )));
    }

    if config.playback.now_playing_refresh_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Now playing refresh interval cannot be 0".to_string(),
        ));
    }

    if let Err(name) = config.voices.qualities() {
        return Err(ConfigError::ValidationError(format!(
            "Unknown voice quality: {}",
            name
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Artifact Directory: {:?}", config.synthesis.artifact_dir);
    tracing::info!(
        "Watchdog: timeout {}s, poll every {}s",
        config.watchdog.timeout_secs,
        config.watchdog.poll_interval_secs
    );
    tracing::info!("Default Rate: {}", config.playback.default_rate);
    tracing::info!("Auto Advance: {}", config.playback.auto_advance);
    tracing::info!("Preferences: {:?}", config.settings.path);
    tracing::info!("Voice Quality Order: {:?}", config.voices.quality_order);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.watchdog.timeout_secs, 15);
        assert_eq!(config.watchdog.poll_interval_secs, 5);
        assert_eq!(config.playback.default_rate, 1.0);
        assert!(!config.playback.auto_advance);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_timeout_not_exceeding_poll() {
        let mut config = AppConfig::default();
        config.watchdog.timeout_secs = 5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.watchdog.poll_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_rate_out_of_range() {
        let mut config = AppConfig::default();
        config.playback.default_rate = 3.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_quality() {
        let mut config = AppConfig::default();
        config.voices.quality_order = vec!["ultra".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tingwen.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[watchdog]\ntimeout_secs = 30\n\n[playback]\nauto_advance = true\n\n[voices]\nquality_order = [\"enhanced\", \"premium\"]"
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.watchdog.timeout_secs, 30);
        assert_eq!(config.watchdog.poll_interval_secs, 5);
        assert!(config.playback.auto_advance);
        assert_eq!(config.voices.quality_order, vec!["enhanced", "premium"]);
    }
}

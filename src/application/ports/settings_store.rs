//! Settings Store Port - 用户播放偏好持久化

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::playback::PlaybackRate;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// 持久化的播放偏好
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPreferences {
    pub auto_advance_enabled: bool,
    pub playback_rate: f32,
}

impl PlaybackPreferences {
    pub fn rate(&self) -> PlaybackRate {
        PlaybackRate::new(self.playback_rate)
    }
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            auto_advance_enabled: false,
            playback_rate: PlaybackRate::NORMAL,
        }
    }
}

pub trait SettingsStorePort: Send + Sync {
    fn load(&self) -> Result<PlaybackPreferences, SettingsError>;
    fn save(&self, preferences: &PlaybackPreferences) -> Result<(), SettingsError>;
}

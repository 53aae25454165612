//! Playback Context - 播放状态

use serde::{Deserialize, Serialize};

/// 播放状态
///
/// ```text
/// Idle → Synthesizing → Playing ⇄ Paused
///             │            │  └→ Finished
///             └→ Failed ←──┘
/// 任意状态 → Idle（stop / cancel）
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Synthesizing,
    Playing,
    Paused,
    Finished,
    Failed,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Synthesizing => "synthesizing",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "synthesizing" => Some(Self::Synthesizing),
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            "finished" => Some(Self::Finished),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// 仍占用合成器或播放器的状态
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Synthesizing | Self::Playing | Self::Paused)
    }

    /// 会话已结束但记录还在
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle | Finished | Failed, Synthesizing) => true,
            (Synthesizing, Playing) => true,
            (Playing, Paused) | (Paused, Playing) => true,
            (Playing, Finished) => true,
            (Synthesizing | Playing | Paused, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

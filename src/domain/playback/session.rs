//! Playback Context - 播放会话

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::PlaybackState;
use crate::domain::voice::LanguageHint;

/// 会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放速率，限制在 0.5 - 2.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;
    pub const NORMAL: f32 = 1.0;

    /// 超出范围的值被夹到边界；NaN 和无穷按正常速率处理
    pub fn new(rate: f32) -> Self {
        if !rate.is_finite() {
            return Self(Self::NORMAL);
        }
        Self(rate.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self(Self::NORMAL)
    }
}

/// 一次播放请求
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub text: String,
    pub title: Option<String>,
    pub language_hint: String,
}

impl StartRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            language_hint: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_language(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = hint.into();
        self
    }
}

/// 播放会话
///
/// 不变量:
/// - 同一时刻只有一个活动会话
/// - state 只按 `PlaybackState::can_transition_to` 允许的路径变化
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub source_text: String,
    pub language_hint: LanguageHint,
    pub title: Option<String>,
    pub normalized_text: String,
    pub state: PlaybackState,
    pub created_at: DateTime<Utc>,
    pub playback_rate: PlaybackRate,
    pub auto_advance_enabled: bool,
}

impl PlaybackSession {
    pub fn new(
        request: StartRequest,
        language_hint: LanguageHint,
        normalized_text: String,
        playback_rate: PlaybackRate,
        auto_advance_enabled: bool,
    ) -> Self {
        Self {
            id: SessionId::new(),
            source_text: request.text,
            language_hint,
            title: request.title,
            normalized_text,
            state: PlaybackState::Idle,
            created_at: Utc::now(),
            playback_rate,
            auto_advance_enabled,
        }
    }

    /// 尝试切换状态，返回旧状态；不允许的切换返回 None 且不改变状态
    pub fn transition_to(&mut self, next: PlaybackState) -> Option<PlaybackState> {
        if !self.state.can_transition_to(next) {
            return None;
        }
        let previous = self.state;
        self.state = next;
        Some(previous)
    }

    /// 展示用标题，没有标题时取正文开头
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => self.source_text.chars().take(20).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_clamped() {
        assert_eq!(PlaybackRate::new(0.1).value(), 0.5);
        assert_eq!(PlaybackRate::new(3.0).value(), 2.0);
        assert_eq!(PlaybackRate::new(1.25).value(), 1.25);
        assert_eq!(PlaybackRate::new(f32::NAN).value(), 1.0);
    }

    #[test]
    fn test_session_transitions() {
        let mut session = PlaybackSession::new(
            StartRequest::new("正文"),
            LanguageHint::Default,
            "正文".to_string(),
            PlaybackRate::default(),
            false,
        );
        assert_eq!(session.state, PlaybackState::Idle);
        assert_eq!(
            session.transition_to(PlaybackState::Synthesizing),
            Some(PlaybackState::Idle)
        );
        assert_eq!(session.transition_to(PlaybackState::Paused), None);
        assert_eq!(session.state, PlaybackState::Synthesizing);
    }

    #[test]
    fn test_display_title_falls_back_to_text() {
        let session = PlaybackSession::new(
            StartRequest::new("今天天气很好").with_title("  "),
            LanguageHint::Default,
            String::new(),
            PlaybackRate::default(),
            false,
        );
        assert_eq!(session.display_title(), "今天天气很好");
    }
}

//! Event Publisher Implementation
//!
//! 播放事件广播，UI 层订阅后收到状态变化、播放结束、请求下一篇和失败通知

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::playback::{PlaybackError, PlaybackState, SessionId};

/// 播放事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 状态变更
    StateChanged {
        session_id: SessionId,
        from: PlaybackState,
        to: PlaybackState,
    },
    /// 自然播放结束，无论是否自动连播都会发出
    Finished { session_id: SessionId },
    /// 请求下一篇；来自自动连播或外部 next 命令
    NextRequested {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// 会话失败
    Failed {
        session_id: SessionId,
        code: String,
        message: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PlaybackEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅播放事件
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.channel.subscribe()
    }

    /// 发布状态变更事件
    pub fn publish_state_changed(
        &self,
        session_id: SessionId,
        from: PlaybackState,
        to: PlaybackState,
    ) {
        self.publish(PlaybackEvent::StateChanged {
            session_id,
            from,
            to,
        });
    }

    /// 发布播放结束事件
    pub fn publish_finished(&self, session_id: SessionId) {
        self.publish(PlaybackEvent::Finished { session_id });
    }

    /// 发布请求下一篇事件
    pub fn publish_next_requested(&self, session_id: Option<SessionId>) {
        self.publish(PlaybackEvent::NextRequested { session_id });
    }

    /// 发布失败事件
    pub fn publish_failed(&self, session_id: SessionId, error: &PlaybackError) {
        self.publish(PlaybackEvent::Failed {
            session_id,
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }

    fn publish(&self, event: PlaybackEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(
                error = %e,
                "Failed to publish playback event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

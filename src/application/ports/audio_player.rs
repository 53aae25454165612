//! Audio Player Port - 音频播放器抽象

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::playback::AudioArtifact;

/// 播放器错误
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Unreadable artifact: {0}")]
    Unreadable(String),

    #[error("Player error: {0}")]
    Backend(String),
}

/// 打开的播放器及其自然播放结束信号
pub struct OpenedPlayer {
    pub player: Box<dyn AudioPlayer>,
    /// 播放到结尾时发送
    ///
    /// `stop` 或丢弃播放器只会丢弃发送端；发送端在播放中被丢弃视为播放器异常退出。
    pub ended: oneshot::Receiver<()>,
}

/// 单个产物的播放器
pub trait AudioPlayer: Send + Sync {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position: Duration);
    fn set_rate(&mut self, rate: f32);
    fn elapsed(&self) -> Duration;
    fn duration(&self) -> Duration;
    fn is_playing(&self) -> bool;
}

/// Audio Player Factory
#[async_trait]
pub trait AudioPlayerFactory: Send + Sync {
    async fn open(&self, artifact: &AudioArtifact) -> Result<OpenedPlayer, PlayerError>;
}

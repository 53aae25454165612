//! Now Playing Port - 系统级媒体控制面板

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 正在播放信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub title: String,
    pub elapsed: Duration,
    pub duration: Duration,
    /// 暂停或合成中为 0
    pub rate: f32,
}

/// 外部传输控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 5] = [
        RemoteCommand::Play,
        RemoteCommand::Pause,
        RemoteCommand::Stop,
        RemoteCommand::Next,
        RemoteCommand::Previous,
    ];
}

pub trait NowPlayingPort: Send + Sync {
    fn publish(&self, info: &NowPlayingInfo);
    fn clear(&self);
    fn set_command_enabled(&self, command: RemoteCommand, enabled: bool);
}

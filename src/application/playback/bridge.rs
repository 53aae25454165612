//! Media Control Bridge - 系统媒体控制面板桥接
//!
//! 把播放快照发布成正在播放信息，并把外部传输命令转给状态机。
//! next 命令只转发成 NextRequested 事件，是否切换由 UI 决定。

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::machine::{PlaybackHandle, PlaybackSnapshot};
use crate::application::ports::{NowPlayingInfo, NowPlayingPort, RemoteCommand};
use crate::domain::playback::PlaybackState;

/// 外部命令处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    CommandFailed,
    Disabled,
}

pub struct MediaControlBridge {
    handle: PlaybackHandle,
    surface: Arc<dyn NowPlayingPort>,
    refresh_interval: Duration,
}

impl MediaControlBridge {
    pub fn new(
        handle: PlaybackHandle,
        surface: Arc<dyn NowPlayingPort>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            handle,
            surface,
            refresh_interval,
        }
    }

    /// 注册传输命令：previous 始终禁用
    pub fn register(&self) {
        for command in RemoteCommand::ALL {
            self.surface
                .set_command_enabled(command, command != RemoteCommand::Previous);
        }
    }

    pub async fn handle_command(&self, command: RemoteCommand) -> CommandStatus {
        let snapshot = match self.handle.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(command = ?command, error = %e, "Remote command failed");
                return CommandStatus::CommandFailed;
            }
        };
        let playing = snapshot.state == PlaybackState::Playing;

        let result = match command {
            RemoteCommand::Play if playing => return CommandStatus::CommandFailed,
            RemoteCommand::Pause if !playing => return CommandStatus::CommandFailed,
            RemoteCommand::Play => self.handle.play().await,
            RemoteCommand::Pause => self.handle.pause().await,
            RemoteCommand::Stop => self.handle.stop().await,
            RemoteCommand::Next => self.handle.request_next().await,
            RemoteCommand::Previous => return CommandStatus::Disabled,
        };

        match result {
            Ok(()) => {
                tracing::debug!(command = ?command, "Remote command handled");
                CommandStatus::Success
            }
            Err(e) => {
                tracing::warn!(command = ?command, error = %e, "Remote command failed");
                CommandStatus::CommandFailed
            }
        }
    }

    /// 快照对应的正在播放信息；Idle 时没有
    pub fn now_playing(snapshot: &PlaybackSnapshot) -> Option<NowPlayingInfo> {
        if snapshot.state == PlaybackState::Idle {
            return None;
        }
        Some(NowPlayingInfo {
            title: snapshot.title.clone().unwrap_or_default(),
            elapsed: snapshot.elapsed,
            duration: snapshot.duration,
            rate: if snapshot.state == PlaybackState::Playing {
                snapshot.rate
            } else {
                0.0
            },
        })
    }

    pub fn publish(&self, snapshot: &PlaybackSnapshot) {
        match Self::now_playing(snapshot) {
            Some(info) => self.surface.publish(&info),
            None => self.surface.clear(),
        }
    }

    /// 状态变化时立即发布，播放中再按固定间隔刷新进度
    pub async fn run(self, cancel: CancellationToken) {
        self.register();

        let mut snapshots = self.handle.watch();
        let initial = snapshots.borrow_and_update().clone();
        self.publish(&initial);

        let period = self.refresh_interval.max(Duration::from_millis(10));
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    self.publish(&snapshot);
                }
                _ = ticker.tick() => {
                    if snapshots.borrow().state != PlaybackState::Playing {
                        continue;
                    }
                    if let Ok(snapshot) = self.handle.snapshot().await {
                        self.publish(&snapshot);
                    }
                }
            }
        }

        self.surface.clear();
        tracing::debug!("Media control bridge stopped");
    }
}

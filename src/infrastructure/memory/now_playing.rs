//! In-Memory Now Playing Center - 内存版媒体控制面板

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::application::ports::{NowPlayingInfo, NowPlayingPort, RemoteCommand};

/// 内存媒体控制面板
pub struct InMemoryNowPlayingCenter {
    current: Mutex<Option<NowPlayingInfo>>,
    commands: DashMap<RemoteCommand, bool>,
}

impl InMemoryNowPlayingCenter {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            commands: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前发布的信息
    pub fn current(&self) -> Option<NowPlayingInfo> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_command_enabled(&self, command: RemoteCommand) -> bool {
        self.commands.get(&command).map(|e| *e).unwrap_or(false)
    }
}

impl Default for InMemoryNowPlayingCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlayingPort for InMemoryNowPlayingCenter {
    fn publish(&self, info: &NowPlayingInfo) {
        tracing::trace!(
            title = %info.title,
            elapsed_ms = info.elapsed.as_millis() as u64,
            rate = info.rate,
            "Now playing updated"
        );
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
    }

    fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn set_command_enabled(&self, command: RemoteCommand, enabled: bool) {
        self.commands.insert(command, enabled);
    }
}

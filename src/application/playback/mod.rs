//! Playback - 播放用例编排
//!
//! 包含：
//! - coordinator: 合成缓冲流写入临时产物
//! - watchdog: 合成停滞检测
//! - controller: 产物播放控制
//! - machine: 串行化的播放状态机与句柄
//! - bridge: 系统媒体控制面板桥接

mod bridge;
mod controller;
mod coordinator;
mod machine;
mod watchdog;

pub use bridge::{CommandStatus, MediaControlBridge};
pub use controller::PlaybackController;
pub use coordinator::{SynthesisCoordinator, SynthesisJob, SynthesisOutcome};
pub use machine::{PlaybackDeps, PlaybackHandle, PlaybackMachineConfig, PlaybackSnapshot};
pub use watchdog::{ProgressTracker, StallWatchdog, WatchdogSettings};

//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（合成引擎、产物存储、播放器、音频输出、媒体面板、设置存储）
//! - playback: 合成协调、看门狗、播放状态机、媒体控制桥接

pub mod playback;
pub mod ports;

// Re-exports
pub use playback::{
    CommandStatus, MediaControlBridge, PlaybackDeps, PlaybackHandle, PlaybackMachineConfig,
    PlaybackSnapshot, WatchdogSettings,
};

pub use ports::{
    ArtifactError, ArtifactStorePort, ArtifactWriter, AudioOutputPort, AudioPlayer,
    AudioPlayerFactory, NowPlayingInfo, NowPlayingPort, OpenedPlayer, OutputError,
    PlaybackPreferences, PlayerError, RemoteCommand, SettingsError, SettingsStorePort,
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest,
};

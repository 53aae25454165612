//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_store;
mod audio_output;
mod audio_player;
mod now_playing;
mod settings_store;
mod speech_synthesizer;

pub use artifact_store::{ArtifactError, ArtifactStorePort, ArtifactWriter};
pub use audio_output::{AudioOutputPort, OutputError};
pub use audio_player::{AudioPlayer, AudioPlayerFactory, OpenedPlayer, PlayerError};
pub use now_playing::{NowPlayingInfo, NowPlayingPort, RemoteCommand};
pub use settings_store::{PlaybackPreferences, SettingsError, SettingsStorePort};
pub use speech_synthesizer::{SpeechSynthesizerPort, SynthesisError, SynthesisRequest};

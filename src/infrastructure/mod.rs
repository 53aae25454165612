//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod memory;
pub mod persistence;

pub use adapters::{
    FakeSpeechSynthesizer, FakeSynthesizerConfig, HeadlessPlayer, HeadlessPlayerFactory,
    WavArtifactStore,
};
pub use events::{EventPublisher, PlaybackEvent};
pub use memory::{ExclusiveAudioOutput, InMemoryNowPlayingCenter, InMemorySettingsStore};
pub use persistence::JsonSettingsStore;

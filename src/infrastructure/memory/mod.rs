//! Memory Layer - In-Memory Adapters
//!
//! 音频输出通道、媒体控制面板和偏好存储的内存实现

mod audio_output;
mod now_playing;
mod settings_store;

pub use audio_output::ExclusiveAudioOutput;
pub use now_playing::InMemoryNowPlayingCenter;
pub use settings_store::InMemorySettingsStore;

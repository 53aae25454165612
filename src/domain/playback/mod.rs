//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 会话与状态机的状态定义
//! - 合成缓冲的采样格式
//! - 临时音频产物的所有权
//! - 错误分类

mod artifact;
mod audio;
mod errors;
mod session;
mod state;

pub use artifact::AudioArtifact;
pub use audio::{AudioBuffer, SampleEncoding, SampleFormat, Samples};
pub use errors::PlaybackError;
pub use session::{PlaybackRate, PlaybackSession, SessionId, StartRequest};
pub use state::PlaybackState;

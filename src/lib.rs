//! Tingwen - 文章朗读播放核心
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Normalization Context: 朗读前的文本规范化规则
//! - Playback Context: 会话、状态、音频产物、错误分类
//! - Voice Context: 语言提示与音色选择
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechSynthesizer, ArtifactStore, AudioPlayer, AudioOutput, NowPlaying, SettingsStore）
//! - Playback: 合成协调、停滞看门狗、播放状态机、媒体控制桥接
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: WAV 产物存储、无声卡播放器、Fake 合成引擎
//! - Memory: 音频输出、媒体面板、偏好存储的内存实现
//! - Persistence: JSON 偏好存储
//! - Events: 播放事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{PlaybackHandle, PlaybackSnapshot};
pub use config::{load_config, AppConfig};
pub use domain::playback::{PlaybackError, PlaybackState, StartRequest};

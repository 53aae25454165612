//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Normalization: 朗读前的文本规范化
//! - Playback: 播放会话、状态、音频产物
//! - Voice: 语言与音色选择

pub mod normalization;
pub mod playback;
pub mod voice;

pub use normalization::NormalizationRuleSet;

//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 语言提示解析
//! - 文本主要文字检测
//! - 按质量偏好选择音色

mod selection;
mod value_objects;

pub use selection::{VoiceChoice, VoiceSelector};
pub use value_objects::{
    is_han, LanguageHint, Script, VoiceDescriptor, VoiceQuality, DEFAULT_LOCALE,
    LATIN_FALLBACK_LOCALE,
};

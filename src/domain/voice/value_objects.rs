//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 拉丁字母文本在没有语言提示时使用的语言
pub const LATIN_FALLBACK_LOCALE: &str = "en-US";

/// 调用方给出的语言提示
///
/// 空字符串、`auto`、`und` 以及所有 `zh*` 标签都视为默认语言。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageHint {
    Default,
    Other(String),
}

impl LanguageHint {
    pub fn parse(hint: &str) -> Self {
        let trimmed = hint.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.is_empty()
            || lower == "auto"
            || lower == "und"
            || lower == "zh"
            || lower.starts_with("zh-")
            || lower.starts_with("zh_")
            || lower == "cmn"
        {
            Self::Default
        } else {
            Self::Other(trimmed.replace('_', "-"))
        }
    }

    pub fn is_default_locale(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// 强制使用的语言；默认语言返回 None，由文本字符决定
    pub fn forced_locale(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Other(tag) => Some(tag),
        }
    }
}

impl Default for LanguageHint {
    fn default() -> Self {
        Self::Default
    }
}

impl std::fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "{}", DEFAULT_LOCALE),
            Self::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// 文本的主要文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Han,
    Latin,
    Unknown,
}

/// 是否为汉字（CJK 统一表意文字及扩展区）
pub fn is_han(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '\u{2A700}'..='\u{2EBEF}'
    )
}

impl Script {
    /// 只要出现一个汉字就算中文，混合文本不能中途换音色
    pub fn detect(text: &str) -> Self {
        let mut latin = 0usize;
        let mut other = 0usize;

        for c in text.chars() {
            if is_han(c) {
                return Self::Han;
            }
            if c.is_ascii_alphabetic() {
                latin += 1;
            } else if c.is_alphabetic() {
                other += 1;
            }
        }

        if latin > 0 && latin >= other {
            Self::Latin
        } else {
            Self::Unknown
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Self::Latin => LATIN_FALLBACK_LOCALE,
            Self::Han | Self::Unknown => DEFAULT_LOCALE,
        }
    }
}

/// 音色质量等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceQuality {
    Premium,
    Enhanced,
    Default,
}

impl VoiceQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Enhanced => "enhanced",
            Self::Default => "default",
        }
    }
}

impl std::str::FromStr for VoiceQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "premium" => Ok(Self::Premium),
            "enhanced" => Ok(Self::Enhanced),
            "default" => Ok(Self::Default),
            other => Err(format!("未知的音色质量: {}", other)),
        }
    }
}

/// 引擎提供的一个音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    /// BCP-47 语言标签，如 `zh-CN`
    pub language: String,
    pub quality: VoiceQuality,
}

impl VoiceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
        quality: VoiceQuality,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            quality,
        }
    }

    /// 主语言子标签，`zh-CN` → `zh`
    pub fn primary_language(&self) -> &str {
        primary_subtag(&self.language)
    }
}

pub(crate) fn primary_subtag(tag: &str) -> &str {
    tag.split(|c| c == '-' || c == '_').next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_hint_default_variants() {
        for hint in ["", " ", "auto", "zh", "zh-CN", "zh_Hans", "ZH-TW", "cmn"] {
            assert!(LanguageHint::parse(hint).is_default_locale(), "{}", hint);
        }
    }

    #[test]
    fn test_language_hint_other() {
        let hint = LanguageHint::parse("en_US");
        assert_eq!(hint, LanguageHint::Other("en-US".to_string()));
        assert_eq!(hint.forced_locale(), Some("en-US"));
    }

    #[test]
    fn test_script_detection() {
        assert_eq!(Script::detect("Hello 世界"), Script::Han);
        assert_eq!(Script::detect("Hello world"), Script::Latin);
        assert_eq!(Script::detect("12345"), Script::Unknown);
        assert_eq!(Script::detect("Привет"), Script::Unknown);
    }

    #[test]
    fn test_primary_language() {
        let voice = VoiceDescriptor::new("v1", "Tingting", "zh-CN", VoiceQuality::Default);
        assert_eq!(voice.primary_language(), "zh");
    }
}

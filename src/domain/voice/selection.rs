//! 音色选择
//!
//! 显式的质量偏好列表，对引擎列出的音色一次性、确定性地求值。

use super::value_objects::{primary_subtag, LanguageHint, Script, VoiceDescriptor, VoiceQuality};

/// 选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChoice {
    /// 目标语言
    pub locale: String,
    /// 选中的音色；None 表示交给引擎用该语言的默认音色
    pub voice: Option<VoiceDescriptor>,
}

/// 音色选择器
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    quality_order: Vec<VoiceQuality>,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self {
            quality_order: vec![
                VoiceQuality::Premium,
                VoiceQuality::Enhanced,
                VoiceQuality::Default,
            ],
        }
    }
}

impl VoiceSelector {
    pub fn new(quality_order: Vec<VoiceQuality>) -> Self {
        if quality_order.is_empty() {
            return Self::default();
        }
        Self { quality_order }
    }

    /// 目标语言：语言提示优先，否则看文本里的文字
    pub fn resolve_locale(hint: &LanguageHint, source_text: &str) -> String {
        match hint.forced_locale() {
            Some(locale) => locale.to_string(),
            None => Script::detect(source_text).locale().to_string(),
        }
    }

    fn rank(&self, quality: VoiceQuality) -> usize {
        self.quality_order
            .iter()
            .position(|q| *q == quality)
            .unwrap_or(self.quality_order.len())
    }

    /// 在给定音色里为目标语言挑一个
    ///
    /// 先找语言标签完全相同的，再退到主语言相同的；组内按质量偏好排序，
    /// 同级按 id 排序保证确定性。
    pub fn select(&self, voices: &[VoiceDescriptor], locale: &str) -> Option<VoiceDescriptor> {
        let exact: Vec<&VoiceDescriptor> = voices
            .iter()
            .filter(|v| v.language.eq_ignore_ascii_case(locale))
            .collect();

        let candidates = if exact.is_empty() {
            let primary = primary_subtag(locale);
            voices
                .iter()
                .filter(|v| v.primary_language().eq_ignore_ascii_case(primary))
                .collect()
        } else {
            exact
        };

        candidates
            .into_iter()
            .min_by(|a, b| {
                self.rank(a.quality)
                    .cmp(&self.rank(b.quality))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned()
    }

    pub fn choose(
        &self,
        hint: &LanguageHint,
        source_text: &str,
        voices: &[VoiceDescriptor],
    ) -> VoiceChoice {
        let locale = Self::resolve_locale(hint, source_text);
        let voice = self.select(voices, &locale);
        VoiceChoice { locale, voice }
    }
}

//! 文本规范化
//!
//! 把文章原文改写成语音引擎能正确朗读的形式：数字区间、年份、分数、缩写等。
//! 规则之间不可交换，按固定顺序执行，后面的规则假定前面的规则已经
//! 统一了标点和数字形式。
//!
//! 纯函数，无副作用，永不失败；没有匹配的规则原样返回输入。

mod abbreviations;
mod numerals;
mod rules;

pub use numerals::{cardinal, decimal, digit_by_digit, formal};
pub use rules::{CANONICAL_DASH, PAUSE_MARKER, RANGE_CONNECTOR, URL_PLACEHOLDER};

use crate::domain::voice::LanguageHint;

/// 一条有名字的规范化规则
#[derive(Clone, Copy)]
pub struct NormalizationRule {
    name: &'static str,
    apply: fn(&str) -> String,
}

impl NormalizationRule {
    pub const fn new(name: &'static str, apply: fn(&str) -> String) -> Self {
        Self { name, apply }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, text: &str) -> String {
        (self.apply)(text)
    }
}

impl std::fmt::Debug for NormalizationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NormalizationRule").field(&self.name).finish()
    }
}

/// 默认语言（中文）的规则顺序
///
/// 分数必须在符号表之前，否则 `/` 先被换成“每”；
/// 区间规则从最具体的单位开始，裸区间兜底。
const DEFAULT_LOCALE_RULES: &[NormalizationRule] = &[
    NormalizationRule::new("strip_quotes", rules::strip_quotes),
    NormalizationRule::new("remove_digit_grouping", rules::remove_digit_grouping),
    NormalizationRule::new("unify_dashes", rules::unify_dashes),
    NormalizationRule::new(
        "mark_percentage_point_decimals",
        rules::mark_percentage_point_decimals,
    ),
    NormalizationRule::new("percent_ranges", rules::percent_ranges),
    NormalizationRule::new("fractions", rules::fractions),
    NormalizationRule::new("age_ranges", rules::age_ranges),
    NormalizationRule::new("academic_year_ranges", rules::academic_year_ranges),
    NormalizationRule::new("year_ranges", rules::year_ranges),
    NormalizationRule::new("years", rules::years),
    NormalizationRule::new("counted_ranges", rules::counted_ranges),
    NormalizationRule::new("duration_ranges", rules::duration_ranges),
    NormalizationRule::new("bare_ranges", rules::bare_ranges),
    NormalizationRule::new("expand_abbreviations", rules::expand_abbreviations),
    NormalizationRule::new("separate_scripts", rules::separate_scripts),
];

/// 其他语言只替换网址，数字规则只针对中文调过
const OTHER_LOCALE_RULES: &[NormalizationRule] =
    &[NormalizationRule::new("replace_urls", rules::replace_urls)];

/// 规范化规则集
#[derive(Debug, Clone)]
pub struct NormalizationRuleSet {
    default_locale: Vec<NormalizationRule>,
    other_locale: Vec<NormalizationRule>,
}

impl Default for NormalizationRuleSet {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE_RULES.to_vec(),
            other_locale: OTHER_LOCALE_RULES.to_vec(),
        }
    }
}

impl NormalizationRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按语言提示规范化文本
    pub fn normalize(&self, text: &str, language_hint: &str) -> String {
        self.normalize_for(text, &LanguageHint::parse(language_hint))
    }

    pub fn normalize_for(&self, text: &str, hint: &LanguageHint) -> String {
        let rules = if hint.is_default_locale() {
            &self.default_locale
        } else {
            &self.other_locale
        };

        rules.iter().fold(text.to_string(), |current, rule| {
            let next = rule.apply(&current);
            if next != current {
                tracing::trace!(rule = rule.name(), output = %next, "Normalization rule applied");
            }
            next
        })
    }

    /// 指定语言下的规则名，按执行顺序
    pub fn rule_names(&self, hint: &LanguageHint) -> Vec<&'static str> {
        let rules = if hint.is_default_locale() {
            &self.default_locale
        } else {
            &self.other_locale
        };
        rules.iter().map(NormalizationRule::name).collect()
    }
}

//! 缩写与符号替换表
//!
//! 区分大小写。条目之间互不重叠，字母开头/结尾的条目只在英文词边界处替换
//! （`AIGC` 不会被拆成 `A I` + `GC`）。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::rules::replace_guarded;

/// 替换表，按类别排列
const ENTRIES: &[(&str, &str)] = &[
    // 逐字母拼读的缩写
    ("AI", "A I"),
    ("API", "A P I"),
    ("APP", "A P P"),
    ("AR", "A R"),
    ("CCTV", "C C T V"),
    ("CEO", "C E O"),
    ("CFO", "C F O"),
    ("CPI", "C P I"),
    ("CPU", "C P U"),
    ("CTO", "C T O"),
    ("GDP", "G D P"),
    ("GPS", "G P S"),
    ("GPU", "G P U"),
    ("IT", "I T"),
    ("NBA", "N B A"),
    ("PC", "P C"),
    ("PDF", "P D F"),
    ("PPI", "P P I"),
    ("PPT", "P P T"),
    ("USB", "U S B"),
    ("VR", "V R"),
    ("WHO", "W H O"),
    // 符号
    ("&", "和"),
    ("@", "艾特"),
    ("#", "井号"),
    ("+", "加"),
    ("=", "等于"),
    ("/", "每"),
    ("×", "乘以"),
    ("÷", "除以"),
    ("≥", "大于等于"),
    ("≤", "小于等于"),
    ("℃", "摄氏度"),
    ("°C", "摄氏度"),
    ("°", "度"),
    // 品牌读音
    ("iPhone", "爱疯"),
    ("iPad", "爱派"),
    ("iOS", "I O S"),
    ("macOS", "麦克 O S"),
    ("WiFi", "歪fai"),
    ("Wi-Fi", "歪fai"),
    ("ChatGPT", "Chat G P T"),
    ("OpenAI", "Open A I"),
    ("YouTube", "优兔"),
];

static TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ENTRIES.iter().copied().collect());

static PATTERN: Lazy<Regex> = Lazy::new(|| {
    let mut keys: Vec<&str> = ENTRIES.iter().map(|(key, _)| *key).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = keys
        .iter()
        .map(|key| regex::escape(key))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("abbreviation table must compile")
});

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// 按替换表改写文本
pub fn expand(text: &str) -> String {
    replace_guarded(&PATTERN, text, |caps, before, after| {
        let key = caps.get(0)?.as_str();
        let starts_word = key.chars().next().is_some_and(is_word_char);
        let ends_word = key.chars().last().is_some_and(is_word_char);

        if starts_word && before.chars().last().is_some_and(is_word_char) {
            return None;
        }
        if ends_word && after.chars().next().is_some_and(is_word_char) {
            return None;
        }

        TABLE.get(key).map(|spoken| spoken.to_string())
    })
}

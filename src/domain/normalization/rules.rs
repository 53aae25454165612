//! 规范化规则
//!
//! 每条规则是一个纯函数。`regex` 不支持前后查看，上下文约束（“后面必须跟着年”、
//! “前面不能是数字”）由 [`replace_guarded`] 在匹配两侧的原文上检查。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::abbreviations;
use super::numerals::{cardinal, decimal, digit_by_digit, formal};

/// 区间连接词
pub const RANGE_CONNECTOR: &str = "到";

/// 统一后的短横线
pub const CANONICAL_DASH: char = '-';

/// 中英文之间插入的停顿
pub const PAUSE_MARKER: &str = "，";

/// 非默认语言文本里网址的替代词
pub const URL_PLACEHOLDER: &str = "link";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("normalization pattern must compile")
}

static URL: Lazy<Regex> =
    Lazy::new(|| pattern(r#"(?:https?://|www\.)[^\s]*[^\s.,;:!?)\]"'>]"#));
static GROUPED_DIGITS: Lazy<Regex> = Lazy::new(|| pattern(r"([0-9]),([0-9]{3})"));
static DASH_VARIANTS: Lazy<Regex> =
    Lazy::new(|| pattern(r"[\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}~\x{FF5E}\x{301C}]"));
static REPEATED_DASH: Lazy<Regex> = Lazy::new(|| pattern(r"-{2,}"));
static PERCENTAGE_POINT: Lazy<Regex> =
    Lazy::new(|| pattern(r"([0-9]+)\.([0-9]+)(个?百分点)"));
static PERCENT_RANGE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"([0-9]+(?:\.[0-9]+)?)[%％]?-([0-9]+(?:\.[0-9]+)?)[%％]")
});
static FRACTION: Lazy<Regex> = Lazy::new(|| pattern(r"([0-9]+)/([0-9]+)"));
static AGE_RANGE: Lazy<Regex> = Lazy::new(|| pattern(r"([0-9]{2})-([0-9]{2})(周?岁)"));
static ACADEMIC_YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"([0-9]{4})-([0-9]{2})(学年|年度|财年|赛季|年代|年)"));
static YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"([0-9]{4})-([0-9]{4})(学年|年度|财年|赛季|年代|年)"));
static CONJOINED_YEARS: Lazy<Regex> =
    Lazy::new(|| pattern(r"([0-9]{4})(和|与|及|或|、|至)([0-9]{4})(年代|年)"));
static LONE_YEAR: Lazy<Regex> = Lazy::new(|| pattern(r"([0-9]{4})(年代|年)"));
static COUNTED_RANGE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"([0-9]+(?:\.[0-9]+)?)-([0-9]+(?:\.[0-9]+)?)",
        r"(个|人|名|位|件|项|次|家|种|条|本|张|只|台|辆|部|座|所|间|天|日|小时|分钟|秒|周|月|倍|",
        r"元|块|万|亿|千|百|公里|千米|厘米|米|公斤|千克|克|吨|岁)"
    ))
});
static DURATION_RANGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"([0-9]{1,3})-([0-9]{1,3})(多?年)"));
static BARE_RANGE: Lazy<Regex> = Lazy::new(|| pattern(r"([0-9]+)-([0-9]+)"));
static HAN_THEN_LATIN: Lazy<Regex> = Lazy::new(|| pattern(r"(\p{Han})([A-Za-z])"));
static LATIN_THEN_HAN: Lazy<Regex> = Lazy::new(|| pattern(r"([A-Za-z])(\p{Han})"));

/// 带上下文检查的替换
///
/// `render` 拿到匹配、匹配之前的原文、匹配之后的原文；返回 `None` 表示保留原样。
pub fn replace_guarded<F>(re: &Regex, text: &str, mut render: F) -> String
where
    F: FnMut(&Captures<'_>, &str, &str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if let Some(replacement) = render(&caps, &text[..whole.start()], &text[whole.end()..]) {
            out.push_str(&text[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
        }
    }

    out.push_str(&text[last..]);
    out
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn ends_with_digit(s: &str) -> bool {
    s.chars().last().is_some_and(|c| c.is_ascii_digit())
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn join_range(from: String, to: String, suffix: &str) -> String {
    format!("{}{}{}{}", from, RANGE_CONNECTOR, to, suffix)
}

/// 非默认语言：网址替换为占位词
pub fn replace_urls(text: &str) -> String {
    URL.replace_all(text, URL_PLACEHOLDER).into_owned()
}

/// 去掉装饰性引号
pub fn strip_quotes(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                c,
                '"' | '\u{201C}'
                    | '\u{201D}'
                    | '\u{201E}'
                    | '\u{201F}'
                    | '\u{2018}'
                    | '\u{2019}'
                    | '\u{300C}'
                    | '\u{300D}'
                    | '\u{300E}'
                    | '\u{300F}'
                    | '\u{FE41}'
                    | '\u{FE42}'
                    | '\u{FE43}'
                    | '\u{FE44}'
                    | '\u{00AB}'
                    | '\u{00BB}'
                    | '\u{FF02}'
            )
        })
        .collect()
}

/// 去掉数字中的千分位逗号：`1,234,567` → `1234567`
pub fn remove_digit_grouping(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = replace_guarded(&GROUPED_DIGITS, &current, |caps, _, after| {
            if starts_with_digit(after) {
                return None;
            }
            Some(format!("{}{}", group(caps, 1), group(caps, 2)))
        });
        if next == current {
            return current;
        }
        current = next;
    }
}

/// 各种破折号、连字符、波浪号统一为 `-` 并合并连续的 `-`
pub fn unify_dashes(text: &str) -> String {
    let unified = DASH_VARIANTS.replace_all(text, "-");
    REPEATED_DASH.replace_all(&unified, "-").into_owned()
}

/// `0.5个百分点` → `0点5个百分点`
pub fn mark_percentage_point_decimals(text: &str) -> String {
    PERCENTAGE_POINT
        .replace_all(text, "${1}点${2}${3}")
        .into_owned()
}

/// `20-25%` → `百分之二十到二十五`
pub fn percent_ranges(text: &str) -> String {
    replace_guarded(&PERCENT_RANGE, text, |caps, before, _| {
        if ends_with_digit(before) || before.ends_with('.') {
            return None;
        }
        Some(format!(
            "百分之{}",
            join_range(decimal(group(caps, 1)), decimal(group(caps, 2)), "")
        ))
    })
}

/// `1/6` → `六分之一`
///
/// 必须在符号表把 `/` 换成“每”之前执行。
pub fn fractions(text: &str) -> String {
    replace_guarded(&FRACTION, text, |caps, before, after| {
        if ends_with_digit(before) || before.ends_with('/') || after.starts_with('/') {
            return None;
        }
        Some(format!(
            "{}分之{}",
            cardinal(group(caps, 2)),
            cardinal(group(caps, 1))
        ))
    })
}

/// `18-35岁` → `壹拾捌到叁拾伍岁`
///
/// 只有年龄区间用大写数字，其他区间都用普通读法。
pub fn age_ranges(text: &str) -> String {
    replace_guarded(&AGE_RANGE, text, |caps, before, _| {
        if ends_with_digit(before) {
            return None;
        }
        Some(join_range(
            formal(group(caps, 1)),
            formal(group(caps, 2)),
            group(caps, 3),
        ))
    })
}

fn digit_range(re: &Regex, text: &str) -> String {
    replace_guarded(re, text, |caps, before, _| {
        if ends_with_digit(before) {
            return None;
        }
        Some(join_range(
            digit_by_digit(group(caps, 1)),
            digit_by_digit(group(caps, 2)),
            group(caps, 3),
        ))
    })
}

/// `2022-23学年` → `二零二二到二三学年`
pub fn academic_year_ranges(text: &str) -> String {
    digit_range(&ACADEMIC_YEAR_RANGE, text)
}

/// `2020-2022年` → `二零二零到二零二二年`
pub fn year_ranges(text: &str) -> String {
    digit_range(&YEAR_RANGE, text)
}

/// `2022年` → `二零二二年`，`2022和2023年` → `二零二二和二零二三年`
pub fn years(text: &str) -> String {
    let conjoined = replace_guarded(&CONJOINED_YEARS, text, |caps, before, _| {
        if ends_with_digit(before) {
            return None;
        }
        Some(format!(
            "{}{}{}{}",
            digit_by_digit(group(caps, 1)),
            group(caps, 2),
            digit_by_digit(group(caps, 3)),
            group(caps, 4)
        ))
    });

    replace_guarded(&LONE_YEAR, &conjoined, |caps, before, _| {
        if ends_with_digit(before) {
            return None;
        }
        Some(format!("{}{}", digit_by_digit(group(caps, 1)), group(caps, 2)))
    })
}

fn cardinal_range(re: &Regex, text: &str) -> String {
    replace_guarded(re, text, |caps, before, _| {
        if ends_with_digit(before) || before.ends_with('.') {
            return None;
        }
        Some(join_range(
            decimal(group(caps, 1)),
            decimal(group(caps, 2)),
            group(caps, 3),
        ))
    })
}

/// `10-20人` → `十到二十人`，`1.5-3万元` → `一点五到三万元`
pub fn counted_ranges(text: &str) -> String {
    cardinal_range(&COUNTED_RANGE, text)
}

/// `3-5年` → `三到五年`（时长，不是年份）
pub fn duration_ranges(text: &str) -> String {
    cardinal_range(&DURATION_RANGE, text)
}

/// 其余没有单位的区间：`3-5` → `3到5`
///
/// 后面跟着年份词的不动；`2024-01-05` 这样的日期也不动。
pub fn bare_ranges(text: &str) -> String {
    replace_guarded(&BARE_RANGE, text, |caps, before, after| {
        if after.starts_with('年') || after.starts_with("学年") {
            return None;
        }
        let date_part = |s: &str| s.strip_prefix('-').is_some_and(starts_with_digit);
        if date_part(after) || before.strip_suffix('-').is_some_and(ends_with_digit) {
            return None;
        }
        Some(join_range(
            group(caps, 1).to_string(),
            group(caps, 2).to_string(),
            "",
        ))
    })
}

/// 缩写、符号、品牌名替换
pub fn expand_abbreviations(text: &str) -> String {
    abbreviations::expand(text)
}

/// 汉字与拉丁字母相邻处插入停顿
pub fn separate_scripts(text: &str) -> String {
    let marker = format!("${{1}}{}${{2}}", PAUSE_MARKER);
    let forward = HAN_THEN_LATIN.replace_all(text, marker.as_str());
    LATIN_THEN_HAN.replace_all(&forward, marker.as_str()).into_owned()
}

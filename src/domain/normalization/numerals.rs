//! 数字读法
//!
//! 三种读法：
//! - 基数读法（二十五、一百零五），用于大多数数字区间
//! - 逐位读法（二零二二），用于年份
//! - 大写读法（贰拾伍），只用于年龄区间

/// 一套数字字符及位权单位
struct NumeralSet {
    digits: [&'static str; 10],
    /// 千、百、十
    units: [&'static str; 3],
    /// 10-19 开头是否省略“一”（十五 vs 壹拾伍）
    omit_leading_one: bool,
}

const STANDARD: NumeralSet = NumeralSet {
    digits: ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"],
    units: ["千", "百", "十"],
    omit_leading_one: true,
};

const FORMAL: NumeralSet = NumeralSet {
    digits: ["零", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"],
    units: ["仟", "佰", "拾"],
    omit_leading_one: false,
};

/// 每四位一节的节权
const SECTION_UNITS: [&str; 5] = ["", "万", "亿", "万亿", "亿亿"];

/// 小数点读法
pub const POINT_WORD: &str = "点";

impl NumeralSet {
    /// 读一个 0..10000 的节，节内的零按需补“零”
    fn read_section(&self, n: u64, out: &mut String) {
        let places = [(1000, self.units[0]), (100, self.units[1]), (10, self.units[2]), (1, "")];
        let start_len = out.len();
        let mut pending_zero = false;

        for (place, unit) in places {
            let digit = (n / place % 10) as usize;
            if digit == 0 {
                if out.len() > start_len {
                    pending_zero = true;
                }
                continue;
            }
            if pending_zero {
                out.push_str(self.digits[0]);
                pending_zero = false;
            }
            out.push_str(self.digits[digit]);
            out.push_str(unit);
        }
    }

    fn read(&self, n: u64) -> String {
        if n == 0 {
            return self.digits[0].to_string();
        }

        let mut sections = Vec::new();
        let mut rest = n;
        while rest > 0 {
            sections.push(rest % 10_000);
            rest /= 10_000;
        }

        let mut out = String::new();
        let mut pending_zero = false;
        for (index, &section) in sections.iter().enumerate().rev() {
            if section == 0 {
                if !out.is_empty() {
                    pending_zero = true;
                }
                continue;
            }
            if !out.is_empty() && (pending_zero || section < 1000) {
                out.push_str(self.digits[0]);
            }
            self.read_section(section, &mut out);
            out.push_str(SECTION_UNITS[index]);
            pending_zero = false;
        }

        if self.omit_leading_one {
            let leading = format!("{}{}", self.digits[1], self.units[2]);
            if out.starts_with(&leading) {
                out.replace_range(..self.digits[1].len(), "");
            }
        }

        out
    }
}

/// 基数读法：`25` → `二十五`
///
/// 超出 u64 范围或含非数字字符时退回逐位读法。
pub fn cardinal(digits: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) => STANDARD.read(n),
        Err(_) => digit_by_digit(digits),
    }
}

/// 带小数的基数读法：`2.5` → `二点五`
pub fn decimal(number: &str) -> String {
    match number.split_once('.') {
        Some((int, frac)) if !frac.is_empty() => {
            format!("{}{}{}", cardinal(int), POINT_WORD, digit_by_digit(frac))
        }
        _ => cardinal(number.trim_end_matches('.')),
    }
}

/// 逐位读法：`2022` → `二零二二`
pub fn digit_by_digit(digits: &str) -> String {
    digits
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => STANDARD.digits[d as usize].to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// 大写读法：`35` → `叁拾伍`
pub fn formal(digits: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) => FORMAL.read(n),
        Err(_) => digits.to_string(),
    }
}

//! Per-field shape rules shared by every line strategy.
//!
//! The strict single-regex strategies are assembled from the `*_PATTERN`
//! fragments below, while the split-based strategies call the predicates.
//! Both encode the same character classes.

pub const POLICY_PATTERN: &str = r"[0-9]{9,10}[A-Z]?";
pub const NAME_CLASS: &str = r"[A-Z0-9 .,'\-&/]";
pub const PLAN_PATTERN: &str = r"[A-Z0-9\-]+";
pub const PREMIUM_PATTERN: &str = r"[0-9,]+\.[0-9]{2}";
pub const AGENT_ID_PATTERN: &str = r"[0-9]{6,7}";

/// 9–10 digits with an optional trailing upper-case letter.
pub fn is_policy_number(value: &str) -> bool {
    let digits = value
        .strip_suffix(|character: char| character.is_ascii_uppercase())
        .unwrap_or(value);
    (9..=10).contains(&digits.len()) && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Trimmed variant used when sniffing spreadsheet columns.
pub fn is_valid_policy_number(value: &str) -> bool {
    is_policy_number(value.trim())
}

/// Insured and agent names as printed: upper-case letters, digits and a
/// little punctuation.
pub fn is_report_name(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|character| {
            character.is_ascii_uppercase()
                || character.is_ascii_digit()
                || matches!(character, ' ' | '.' | ',' | '\'' | '-' | '&' | '/')
        })
}

pub fn is_plan_code(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|character| {
                character.is_ascii_uppercase() || character.is_ascii_digit() || character == '-'
            })
}

/// Digits with optional thousands separators and exactly two decimals.
pub fn is_premium(value: &str) -> bool {
    let Some((integer, fraction)) = value.rsplit_once('.') else {
        return false;
    };
    !integer.is_empty()
        && integer
            .chars()
            .all(|character| character.is_ascii_digit() || character == ',')
        && fraction.len() == 2
        && fraction.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn is_agent_id(value: &str) -> bool {
    (6..=7).contains(&value.len()) && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Two-digit bill day on a return-draft item.
pub fn is_bill_day(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// `mm/dd/yy` through `mm/dd/yyyy` as printed on return-draft items.
pub fn is_item_date(value: &str) -> bool {
    let parts = value.split('/').collect::<Vec<&str>>();
    let [month, day, year] = parts[..] else {
        return false;
    };
    let all_digits = |text: &str| text.bytes().all(|byte| byte.is_ascii_digit());
    month.len() == 2
        && day.len() == 2
        && (2..=4).contains(&year.len())
        && all_digits(month)
        && all_digits(day)
        && all_digits(year)
}

/// Return reason codes such as `R01`.
pub fn is_reason_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 3 && bytes[0] == b'R' && bytes[1].is_ascii_digit() && bytes[2].is_ascii_digit()
}

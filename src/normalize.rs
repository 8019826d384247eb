use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Two-digit years at or above this value belong to the 1900s, mirroring the
/// POSIX `%y` pivot used by the report generators.
const SHORT_YEAR_PIVOT: i32 = 69;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DateFormat {
    MonthDayShortYear,
    MonthDayLongYear,
}

const DATE_FORMATS: [DateFormat; 2] = [DateFormat::MonthDayShortYear, DateFormat::MonthDayLongYear];

/// Parses `m/d/yy` or `m/d/yyyy` (tried in that order) into a calendar date.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| parse_with_format(raw, *format))
}

/// Canonical `YYYY-MM-DD` form of [`parse_report_date`].
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_report_date(raw).map(|date| date.format("%Y-%m-%d").to_string())
}

fn parse_with_format(raw: &str, format: DateFormat) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let month = parse_digits(parts.next()?, 1, 2)?;
    let day = parse_digits(parts.next()?, 1, 2)?;
    let year_text = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let year = match format {
        DateFormat::MonthDayShortYear => {
            let short = parse_digits(year_text, 2, 2)? as i32;
            if short >= SHORT_YEAR_PIVOT {
                1900 + short
            } else {
                2000 + short
            }
        }
        DateFormat::MonthDayLongYear => parse_digits(year_text, 4, 4)? as i32,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_digits(text: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if text.len() < min_len
        || text.len() > max_len
        || !text.chars().all(|character| character.is_ascii_digit())
    {
        return None;
    }
    text.parse::<u32>().ok()
}

/// Parses currency tokens such as `1,234.56`, `52.61` or `.00`.
///
/// The integer part may be empty or carry thousands separators; the fraction
/// must be exactly two digits. Anything else yields `None`.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (integer, fraction) = raw.rsplit_once('.')?;
    if fraction.len() != 2 || !fraction.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    if !integer
        .chars()
        .all(|character| character.is_ascii_digit() || character == ',')
    {
        return None;
    }

    let digits = integer.replace(',', "");
    let digits = if digits.is_empty() { "0" } else { digits.as_str() };
    format!("{digits}.{fraction}").parse::<f64>().ok()
}

/// Exact decimal parse for spreadsheet cells: trims and drops separators.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', "");
    cleaned.parse::<Decimal>().ok()
}

/// Title-cases like the report writers expect: a letter is upper-cased when
/// it follows a non-letter, lower-cased otherwise (`O'NEIL` → `O'Neil`).
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for character in input.chars() {
        if character.is_alphabetic() {
            if previous_is_letter {
                out.extend(character.to_lowercase());
            } else {
                out.extend(character.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(character);
            previous_is_letter = false;
        }
    }
    out
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// First `limit` characters of `text`, never splitting a code point.
pub fn leading_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_date_prefers_two_digit_year() {
        assert_eq!(normalize_date("08/22/25").as_deref(), Some("2025-08-22"));
        assert_eq!(normalize_date("8/2/25").as_deref(), Some("2025-08-02"));
        assert_eq!(normalize_date("12/31/99").as_deref(), Some("1999-12-31"));
        assert_eq!(normalize_date("01/01/68").as_deref(), Some("2068-01-01"));
    }

    #[test]
    fn normalize_date_falls_back_to_four_digit_year() {
        assert_eq!(normalize_date("08/22/2025").as_deref(), Some("2025-08-22"));
        assert_eq!(normalize_date(" 1/5/2024 ").as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn normalize_date_rejects_invalid_calendar_dates() {
        assert_eq!(normalize_date("02/30/2024"), None);
        assert_eq!(normalize_date("13/01/24"), None);
        assert_eq!(normalize_date("08/22/202"), None);
        assert_eq!(normalize_date("2025-08-22"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn normalized_dates_survive_reformat_and_reparse() {
        for raw in ["08/22/25", "1/5/2024", "02/29/2024", "12/31/99", "7/4/1976"] {
            let canonical = parse_report_date(raw).expect("date should parse");
            let reformatted = canonical.format("%m/%d/%Y").to_string();
            assert_eq!(
                normalize_date(&reformatted),
                normalize_date(raw),
                "round trip for {raw}"
            );
        }
    }

    #[test]
    fn parse_currency_handles_separators_and_zero_token() {
        assert_eq!(parse_currency("52.61"), Some(52.61));
        assert_eq!(parse_currency("1,234,567.89"), Some(1_234_567.89));
        assert_eq!(parse_currency(".00"), Some(0.0));
        assert_eq!(parse_currency("150"), None);
        assert_eq!(parse_currency("15.0"), None);
        assert_eq!(parse_currency("12a.00"), None);
    }

    #[test]
    fn parse_decimal_accepts_plain_and_separated_values() {
        assert_eq!(parse_decimal(" 100,000 "), Some(Decimal::new(100_000, 0)));
        assert_eq!(parse_decimal("33.5"), Some(Decimal::new(335, 1)));
        assert_eq!(
            parse_decimal("25,000,000.01"),
            Some(Decimal::new(2_500_000_001, 2))
        );
        assert_eq!(parse_decimal("n/a"), None);
    }

    #[test]
    fn title_case_matches_report_conventions() {
        assert_eq!(title_case("DOE JANE"), "Doe Jane");
        assert_eq!(title_case("O'NEIL MARY-ANN"), "O'Neil Mary-Ann");
        assert_eq!(title_case("SMITH JOHN A"), "Smith John A");
    }

    #[test]
    fn leading_chars_respects_char_boundaries() {
        assert_eq!(leading_chars("ação", 2), "aç");
        assert_eq!(leading_chars("abc", 10), "abc");
    }
}

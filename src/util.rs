// Utility helpers for parsing and basic statistics.
//
// This module centralizes the forgiving CSV number handling so the rest of
// the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};
use std::io::BufRead;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (`NaN`, `n/a`, ...).
/// - Strips thousands separators like `","` before parsing, but only when
///   they group the integer part in threes (`1,234.5`). A decimal comma such
///   as `3,5` is not a number here.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if s.contains(',') && !has_thousands_grouping(s) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn has_thousands_grouping(s: &str) -> bool {
    let (int_part, frac) = s.split_once('.').unwrap_or((s, ""));
    if frac.contains(',') {
        return false;
    }
    let int_part = int_part.trim_start_matches(|c| c == '-' || c == '+');
    let mut groups = int_part.split(',');
    let lead = groups.next().unwrap_or("");
    let digits = |g: &str| g.chars().all(|c| c.is_ascii_digit());
    (1..=3).contains(&lead.len())
        && digits(lead)
        && groups.all(|g| g.len() == 3 && digits(g))
}

/// Years arrive either as `2020` or, when the sheet column held blanks, as a
/// float like `2020.0`. Both coerce to the integer year.
pub fn parse_year(s: Option<&str>) -> Option<i32> {
    let v = parse_f64_safe(s)?;
    if v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i32)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Arithmetic mean of the present values; `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with a fixed number of decimal places and
    // locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Like [`format_number`] but renders "no value" as an empty string.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals)).unwrap_or_default()
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// One line of console input without its surrounding whitespace. `None`
/// once the input is closed or unreadable.
pub fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forgiving_numbers() {
        assert_eq!(parse_f64_safe(Some(" 3.5 ")), Some(3.5));
        assert_eq!(parse_f64_safe(Some("1,234.5")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("-12,345,678")), Some(-12345678.0));
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn decimal_comma_is_not_a_number() {
        assert_eq!(parse_f64_safe(Some("3,5")), None);
        assert_eq!(parse_f64_safe(Some("1,23")), None);
        assert_eq!(parse_f64_safe(Some("1234,567")), None);
        assert_eq!(parse_f64_safe(Some("1,234.5,6")), None);
    }

    #[test]
    fn parses_float_years() {
        assert_eq!(parse_year(Some("2020")), Some(2020));
        assert_eq!(parse_year(Some("2021.0")), Some(2021));
        assert_eq!(parse_year(Some("sin dato")), None);
    }

    #[test]
    fn mean_of_nothing_is_no_value() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.675_1), 2.68);
        assert_eq!(round2(-1.004), -1.0);
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-3.5, 2), "-3.50");
        assert_eq!(format_opt(None, 2), "");
        assert_eq!(format_int(9855), "9,855");
    }

    #[test]
    fn closed_input_yields_no_line() {
        let mut input: &[u8] = b"  2 \n\n";
        assert_eq!(read_trimmed_line(&mut input).as_deref(), Some("2"));
        assert_eq!(read_trimmed_line(&mut input).as_deref(), Some(""));
        assert_eq!(read_trimmed_line(&mut input), None);
        assert_eq!(read_trimmed_line(&mut &b""[..]), None);
    }
}

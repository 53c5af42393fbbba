//! Number normalisation: noisy OCR token → canonical decimal string.
//!
//! OCR engines routinely misread the minus sign (`−`, `–`, `—`, even `=` or
//! `©`), drop the decimal point, or split one number into several tokens.
//! [`normalize_number`] repairs a single token; [`parse_number`] additionally
//! parses it, returning `None` when the token cannot be recovered.
//!
//! ## Steps (applied in order)
//!
//! 1. Remove embedded spaces
//! 2. Collapse leading negative-sign-like glyphs into a single `-`
//! 3. Drop everything except ASCII digits, `.` and `-`
//! 4. Keep only the first `.` (later digits are concatenated)
//! 5. Insert a `.` after the first digit when none is present
//! 6. Truncate the fractional part to [`MAX_FRACTION_DIGITS`]

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of digits kept after the decimal point.
pub const MAX_FRACTION_DIGITS: usize = 9;

/// A successfully recovered number: parsed value plus the canonical text.
///
/// `canonical` is what ends up in the XYZ file, so the original precision is
/// preserved instead of whatever `f64` formatting would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedNumber {
    pub value: f64,
    pub canonical: String,
}

static RE_LEADING_NEG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-−–—=©]+\s*)+").unwrap());

/// Repair a noisy numeric token into a canonical decimal string.
///
/// The result is not guaranteed to be a valid float (e.g. `""` or `"1-2"`);
/// use [`parse_number`] when a value is needed.
pub fn normalize_number(input: &str) -> String {
    let s = input.replace(' ', "");
    let s = RE_LEADING_NEG.replace(&s, "-");
    let s: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let s = keep_first_decimal_point(&s);
    let s = insert_missing_decimal_point(s);
    truncate_fraction(&s, MAX_FRACTION_DIGITS)
}

/// Normalise and parse a token. `None` means the token is unrecoverable.
pub fn parse_number(input: &str) -> Option<NormalizedNumber> {
    let canonical = normalize_number(input);
    let value = canonical.parse::<f64>().ok()?;
    Some(NormalizedNumber { value, canonical })
}

fn keep_first_decimal_point(s: &str) -> String {
    match s.split_once('.') {
        Some((int_part, rest)) if rest.contains('.') => {
            format!("{}.{}", int_part, rest.replace('.', ""))
        }
        _ => s.to_string(),
    }
}

/// `1234567` → `1.234567`, `-1234` → `-1.234`. Anything that is not a pure
/// digit run (minus sign allowed in front) is returned untouched.
fn insert_missing_decimal_point(s: String) -> String {
    if s.contains('.') {
        return s;
    }
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return s;
    }
    let (int_part, frac) = digits.split_at(1);
    format!("{sign}{int_part}.{frac}")
}

fn truncate_fraction(s: &str, max_digits: usize) -> String {
    match s.split_once('.') {
        Some((int_part, frac)) => {
            let frac: String = frac.chars().take(max_digits).collect();
            format!("{int_part}.{frac}")
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_number_passthrough() {
        assert_eq!(normalize_number("-1.332314"), "-1.332314");
        assert_eq!(normalize_number("0.071934"), "0.071934");
    }

    #[test]
    fn test_misread_minus_signs() {
        for input in ["−−123.456", "–123.456", "—123.456", "=123.456", "© 123.456"] {
            assert_eq!(normalize_number(input), "-123.456", "input: {input}");
        }
    }

    #[test]
    fn test_stray_characters_removed() {
        assert_eq!(normalize_number("1.23a4|5"), "1.2345");
        assert_eq!(normalize_number("0. 071 934"), "0.071934");
    }

    #[test]
    fn test_multiple_decimal_points_keep_first() {
        assert_eq!(normalize_number("1.234.567"), "1.234567");
        assert_eq!(normalize_number("-0.1.2.3"), "-0.123");
    }

    #[test]
    fn test_missing_decimal_point_inserted_after_first_digit() {
        assert_eq!(normalize_number("1234567"), "1.234567");
        assert_eq!(normalize_number("-3008463360"), "-3.008463360");
        assert_eq!(normalize_number("7"), "7.");
    }

    #[test]
    fn test_fraction_truncated_to_nine_digits() {
        assert_eq!(normalize_number("1.1234567891234"), "1.123456789");
        assert_eq!(normalize_number("12345678901234"), "1.234567890");
    }

    #[test]
    fn test_parse_number_success() {
        let n = parse_number("−2.5").expect("should parse");
        assert_eq!(n.canonical, "-2.5");
        assert_eq!(n.value, -2.5);
    }

    #[test]
    fn test_parse_number_failures() {
        assert!(parse_number("").is_none());
        assert!(parse_number("...").is_none());
        assert!(parse_number("abc").is_none());
        assert!(parse_number("-").is_none());
        assert!(parse_number("1-2").is_none());
    }

    #[test]
    fn test_canonical_round_trips() {
        for s in ["3.141592653", "-0.000000001", "12.5", "0.0"] {
            let n = parse_number(s).unwrap();
            assert_eq!(n.canonical.parse::<f64>().unwrap(), n.value);
        }
    }

    #[test]
    fn test_idempotent_with_single_decimal_point() {
        for s in ["1.5", "-2.000000001", "0.1234567891234", "—4.2"] {
            let once = normalize_number(s);
            assert_eq!(normalize_number(&once), once, "input: {s}");
        }
    }
}

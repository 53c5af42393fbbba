//! Line tokenisation: one noisy atom line → one [`AtomRecord`].
//!
//! OCR splits numbers at random (`1.23 4567890`) and glues unrelated glyphs
//! onto them, so whitespace cannot be trusted as a field delimiter. Instead
//! the tokenizer rebuilds numeric fields by merging consecutive tokens until a
//! field holds enough digits ([`TokenizerPolicy::merge_digit_threshold`]), then
//! hands each merged field to the number normaliser.
//!
//! A line that does not yield exactly three coordinates is rejected with a
//! [`LineError`]; the caller logs it and moves on. Dropping an atom is
//! preferred over guessing a coordinate.

use crate::error::LineError;
use crate::xyz::element::correct_element_symbol;
use crate::xyz::molecule::AtomRecord;
use crate::xyz::number::{parse_number, NormalizedNumber};
use serde::{Deserialize, Serialize};

/// Default digit count a numeric field must reach before merging stops.
///
/// Matches the 9-decimal coordinates (`-3.008463360`) of the tables this
/// pipeline was tuned on.
pub const DEFAULT_MERGE_DIGIT_THRESHOLD: usize = 10;

/// Where the element descriptor sits on an atom line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementPosition {
    /// Last token wins when it contains a letter, otherwise the first token
    /// when it does, otherwise the last token. (default)
    #[default]
    Auto,
    /// `x y z El`, the OCR table layout.
    Trailing,
    /// `El x y z`, the conventional XYZ layout.
    Leading,
}

/// Tuning knobs for [`tokenize_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerPolicy {
    pub merge_digit_threshold: usize,
    pub element_position: ElementPosition,
}

impl Default for TokenizerPolicy {
    fn default() -> Self {
        Self {
            merge_digit_threshold: DEFAULT_MERGE_DIGIT_THRESHOLD,
            element_position: ElementPosition::default(),
        }
    }
}

/// Parse one atom line into an [`AtomRecord`].
pub fn tokenize_line(line: &str, policy: &TokenizerPolicy) -> Result<AtomRecord, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(LineError::EmptyLine);
    }

    let (element_token, numeric_tokens) = split_element(&tokens, policy.element_position);
    let element = correct_element_symbol(element_token);
    if element.is_empty() {
        return Err(LineError::EmptyElement {
            line: line.to_string(),
            token: element_token.to_string(),
        });
    }

    let numbers: Vec<NormalizedNumber> =
        merge_numeric_fields(numeric_tokens, policy.merge_digit_threshold)
            .iter()
            .filter_map(|field| parse_number(field))
            .collect();

    match <[NormalizedNumber; 3]>::try_from(numbers) {
        Ok([x, y, z]) => Ok(AtomRecord {
            element,
            x: x.value,
            y: y.value,
            z: z.value,
            x_str: x.canonical,
            y_str: y.canonical,
            z_str: z.canonical,
        }),
        Err(numbers) => Err(LineError::FieldCountMismatch {
            line: line.to_string(),
            found: numbers.len(),
        }),
    }
}

/// Merge whitespace tokens into numeric fields.
///
/// Each field starts from a token stripped to `[0-9.-]`. While the field has
/// fewer than `threshold` digits, the digits of the following token are
/// appended. A following token without digits ends the merge and is dropped.
pub fn merge_numeric_fields(tokens: &[&str], threshold: usize) -> Vec<String> {
    let mut fields = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let mut field: String = tokens[i]
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        while digit_count(&field) < threshold && i + 1 < tokens.len() {
            i += 1;
            let digits: String = tokens[i].chars().filter(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            field.push_str(&digits);
        }

        fields.push(field);
        i += 1;
    }

    fields
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(char::is_ascii_digit).count()
}

fn split_element<'a>(tokens: &'a [&'a str], position: ElementPosition) -> (&'a str, &'a [&'a str]) {
    let has_letter = |t: &str| t.chars().any(char::is_alphabetic);
    let leading = match position {
        ElementPosition::Leading => true,
        ElementPosition::Trailing => false,
        ElementPosition::Auto => {
            tokens.len() > 1 && !has_letter(tokens[tokens.len() - 1]) && has_letter(tokens[0])
        }
    };

    if leading {
        (tokens[0], &tokens[1..])
    } else {
        (tokens[tokens.len() - 1], &tokens[..tokens.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TokenizerPolicy {
        TokenizerPolicy::default()
    }

    #[test]
    fn test_well_formed_leading_element() {
        let atom = tokenize_line("C 1.234567890 2.345678901 3.456789012", &policy()).unwrap();
        assert_eq!(atom.element, "C");
        assert_eq!(atom.x_str, "1.234567890");
        assert_eq!(atom.y_str, "2.345678901");
        assert_eq!(atom.z_str, "3.456789012");
    }

    #[test]
    fn test_well_formed_trailing_element() {
        let atom = tokenize_line("-3.008463360 0.071934123 0.041918456 Pd", &policy()).unwrap();
        assert_eq!(atom.element, "Pd");
        assert_eq!(atom.x_str, "-3.008463360");
        assert_eq!(atom.x, -3.00846336);
    }

    #[test]
    fn test_fragmented_number_is_rebuilt() {
        let atom = tokenize_line("C 1.23 4567890 2.345678901 3.456789012", &policy()).unwrap();
        assert_eq!(atom.x_str, "1.234567890");
        assert_eq!(atom.y_str, "2.345678901");
        assert_eq!(atom.z_str, "3.456789012");
    }

    #[test]
    fn test_missing_decimal_point_recovered() {
        let atom = tokenize_line("1234567890 -2345678901 3.456789012 Car", &policy()).unwrap();
        assert_eq!(atom.element, "C");
        assert_eq!(atom.x_str, "1.234567890");
        assert_eq!(atom.y_str, "-2.345678901");
    }

    #[test]
    fn test_short_numbers_merge_and_fail() {
        // With the default threshold, 6-decimal values swallow their neighbours.
        let err = tokenize_line("Pd -1.332314 0.071934 0.041918", &policy()).unwrap_err();
        assert!(matches!(err, LineError::FieldCountMismatch { found: 2, .. }));
    }

    #[test]
    fn test_short_numbers_with_lower_threshold() {
        let policy = TokenizerPolicy {
            merge_digit_threshold: 7,
            ..TokenizerPolicy::default()
        };
        let atom = tokenize_line("Pd -1.332314 0.071934 0.041918", &policy).unwrap();
        assert_eq!(atom.element, "Pd");
        assert_eq!(atom.x_str, "-1.332314");
        assert_eq!(atom.y_str, "0.071934");
        assert_eq!(atom.z_str, "0.041918");
    }

    #[test]
    fn test_too_many_fields_rejected() {
        let err = tokenize_line(
            "1.234567890 2.345678901 3.456789012 4.567890123 C",
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, LineError::FieldCountMismatch { found: 4, .. }));
    }

    #[test]
    fn test_empty_line() {
        assert!(matches!(
            tokenize_line("   ", &policy()),
            Err(LineError::EmptyLine)
        ));
    }

    #[test]
    fn test_unresolvable_element() {
        let err = tokenize_line("1.234567890 2.345678901 3.456789012 42", &policy()).unwrap_err();
        assert!(matches!(err, LineError::EmptyElement { .. }));
    }

    #[test]
    fn test_merge_stops_at_non_numeric_token() {
        let fields = merge_numeric_fields(&["1.23", "xx", "2.345678901"], 10);
        assert_eq!(fields, vec!["1.23", "2.345678901"]);
    }

    #[test]
    fn test_merge_concatenates_digits_only() {
        let fields = merge_numeric_fields(&["-0.12", "3.4", "56789", "9.9"], 10);
        assert_eq!(fields, vec!["-0.123456789", "9.9"]);
    }

    #[test]
    fn test_explicit_positions() {
        let trailing = TokenizerPolicy {
            element_position: ElementPosition::Trailing,
            ..TokenizerPolicy::default()
        };
        // `3.456789012` corrects to `O` through the `0\d+` rule, leaving two coordinates.
        let err = tokenize_line("C 1.234567890 2.345678901 3.456789012", &trailing).unwrap_err();
        assert!(matches!(err, LineError::FieldCountMismatch { found: 2, .. }));

        let err = tokenize_line("C 1.234567890 2.345678901 3.456789", &trailing).unwrap_err();
        assert!(matches!(err, LineError::EmptyElement { .. }));

        let leading = TokenizerPolicy {
            element_position: ElementPosition::Leading,
            ..TokenizerPolicy::default()
        };
        let atom = tokenize_line("N3 1.234567890 2.345678901 3.456789012", &leading).unwrap();
        assert_eq!(atom.element, "N");
    }
}

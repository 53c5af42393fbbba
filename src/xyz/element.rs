//! Element symbol correction for OCR'd atom descriptors.
//!
//! The trailing token of an OCR'd atom row is usually the element symbol, but
//! it often arrives decorated with atom-type suffixes (`C.ar`, `N3`) or
//! confused glyphs (`0` for `O`). [`correct_element_symbol`] maps such tokens
//! onto a best-guess symbol and never fails: anything it cannot resolve comes
//! back as a letters-only residue so it can be flagged for manual review.
//!
//! ## Rule Order
//!
//! The substitution table is applied top to bottom and each rule rewrites all
//! of its matches. Specific patterns (`Car`, `C.ar`) must run before the
//! generic digit-suffix rules; reordering changes the output on ambiguous
//! tokens such as `0ar` or `O1`.

use once_cell::sync::Lazy;
use regex::Regex;

static SUBSTITUTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Car|C.ar", "C"),
        (r"Nar|N.ar", "N"),
        (r"Hes|Has", "H"),
        (r"Qo|0\d+|0.|0|Oar", "O"),
        (r"C\d+", "C"),
        (r"N\d+", "N"),
        (r"F\d+", "F"),
        (r"S\d+", "S"),
        (r"O\d+", "O"),
    ]
    .into_iter()
    .map(|(pattern, symbol)| (Regex::new(pattern).unwrap(), symbol))
    .collect()
});

static RE_RESIDUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d.\-]").unwrap());

/// Map a noisy element token to a canonical symbol (or a `*`-joined residue).
pub fn correct_element_symbol(token: &str) -> String {
    let mut s = capitalize(token.trim());

    for (re, symbol) in SUBSTITUTIONS.iter() {
        if re.is_match(&s) {
            s = re.replace_all(&s, *symbol).into_owned();
        }
    }

    let s = RE_RESIDUE.replace_all(&s, "");
    s.trim().replace(' ', "*")
}

/// Upper-case the first character and lower-case the rest (`cAR` → `Car`).
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_symbols_unchanged() {
        assert_eq!(correct_element_symbol("Pd"), "Pd");
        assert_eq!(correct_element_symbol("P"), "P");
        assert_eq!(correct_element_symbol("Cl"), "Cl");
    }

    #[test]
    fn test_case_is_normalised() {
        assert_eq!(correct_element_symbol("pd"), "Pd");
        assert_eq!(correct_element_symbol("BR"), "Br");
    }

    #[test]
    fn test_aromatic_atom_types() {
        assert_eq!(correct_element_symbol("Car"), "C");
        assert_eq!(correct_element_symbol("C.ar"), "C");
        assert_eq!(correct_element_symbol("N.ar"), "N");
        assert_eq!(correct_element_symbol("Oar"), "O");
    }

    #[test]
    fn test_misread_hydrogen() {
        assert_eq!(correct_element_symbol("Hes"), "H");
        assert_eq!(correct_element_symbol("has"), "H");
    }

    #[test]
    fn test_zero_read_as_oxygen() {
        assert_eq!(correct_element_symbol("0"), "O");
        assert_eq!(correct_element_symbol("012"), "O");
        assert_eq!(correct_element_symbol("Qo"), "O");
    }

    #[test]
    fn test_digit_suffixes_stripped() {
        assert_eq!(correct_element_symbol("C12"), "C");
        assert_eq!(correct_element_symbol("n3"), "N");
        assert_eq!(correct_element_symbol("F1"), "F");
        assert_eq!(correct_element_symbol("S2"), "S");
        assert_eq!(correct_element_symbol("O1"), "O");
    }

    #[test]
    fn test_residue_cleanup() {
        assert_eq!(correct_element_symbol("Pd-1."), "Pd");
        assert_eq!(correct_element_symbol(" Ir "), "Ir");
    }

    #[test]
    fn test_total_on_degenerate_input() {
        assert_eq!(correct_element_symbol(""), "");
        assert_eq!(correct_element_symbol("123"), "");
        assert_eq!(correct_element_symbol("   "), "");
        assert_eq!(correct_element_symbol("..--"), "");
    }

    #[test]
    fn test_internal_space_becomes_placeholder() {
        assert_eq!(correct_element_symbol("pd x"), "Pd*x");
    }
}

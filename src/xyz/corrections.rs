//! Correction table for two-molecule OCR layouts.
//!
//! The OCR segmenter was tuned against one scanned document whose body lines
//! pack two molecules side by side. Its quirks (which token slice holds the
//! coordinates, which rows are anomalous, which digit runs the OCR engine
//! reliably corrupts) live here as data instead of inline conditionals.
//!
//! [`OcrCorrections::default()`] reproduces the table for that document.
//! [`OcrCorrections::none()`] keeps only the layout rules (delimiter aliases,
//! token slices) and drops every row- and digit-level patch. Other documents can supply their own table as
//! JSON via [`OcrCorrections::from_json_file`]; fields missing from the JSON
//! fall back to the default table.

use crate::error::Pdf2XyzError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A slice taken from the end of a token list.
///
/// `skip_last` tokens are dropped from the end, then the `keep` tokens before
/// them are kept. `{ keep: 5, skip_last: 1 }` keeps tokens 6..2 counted from the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingSlice {
    pub keep: usize,
    pub skip_last: usize,
}

impl TrailingSlice {
    pub const fn new(keep: usize, skip_last: usize) -> Self {
        Self { keep, skip_last }
    }

    pub fn apply<'a>(&self, tokens: &[&'a str]) -> Vec<&'a str> {
        let end = tokens.len().saturating_sub(self.skip_last);
        let start = end.saturating_sub(self.keep);
        tokens[start..end].to_vec()
    }
}

/// Slice to use for molecule-2 segments with `token_count` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRule {
    pub token_count: usize,
    pub slice: TrailingSlice,
}

/// A [`SliceRule`] that only applies to one body line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceOverride {
    pub line_index: usize,
    pub token_count: usize,
    pub slice: TrailingSlice,
}

/// Replace every occurrence of `find` with `replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstringRepair {
    pub find: String,
    pub replace: String,
}

impl SubstringRepair {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// All document-specific knowledge used by the OCR segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrCorrections {
    /// Literal misreads of the column delimiter not caught by the generic
    /// delimiter pattern.
    pub delimiter_aliases: Vec<String>,
    /// Tokens dropped from the start of each molecule-1 segment.
    pub molecule1_drop_leading: usize,
    /// Tokens dropped from the end of each molecule-1 segment.
    pub molecule1_drop_trailing: usize,
    /// Molecule-2 token count → slice.
    pub molecule2_slices: Vec<SliceRule>,
    /// Per-line exceptions to `molecule2_slices`.
    pub molecule2_overrides: Vec<SliceOverride>,
    /// Digit repairs for molecule 1; the first matching entry is applied.
    pub molecule1_repairs: Vec<SubstringRepair>,
    /// Digit repairs for molecule 2; the first matching entry is applied.
    pub molecule2_repairs: Vec<SubstringRepair>,
}

impl Default for OcrCorrections {
    fn default() -> Self {
        Self {
            molecule1_repairs: vec![SubstringRepair::new("-3.008463%0", "-3.008463360")],
            molecule2_overrides: vec![
                SliceOverride {
                    line_index: 61,
                    token_count: 11,
                    slice: TrailingSlice::new(5, 1),
                },
                SliceOverride {
                    line_index: 2,
                    token_count: 9,
                    slice: TrailingSlice::new(4, 0),
                },
            ],
            molecule2_repairs: vec![
                SubstringRepair::new("97994288", "979942885"),
                SubstringRepair::new("48135742", "481357425"),
                SubstringRepair::new("-3.23071635", "-3.230716365"),
                SubstringRepair::new("2.721697", "2.7221697"),
            ],
            ..Self::none()
        }
    }
}

impl OcrCorrections {
    /// Layout rules only: no per-line overrides and no digit repairs.
    pub fn none() -> Self {
        Self {
            delimiter_aliases: vec!["¥O001".to_string()],
            molecule1_drop_leading: 2,
            molecule1_drop_trailing: 1,
            molecule2_slices: vec![
                SliceRule {
                    token_count: 12,
                    slice: TrailingSlice::new(5, 1),
                },
                SliceRule {
                    token_count: 11,
                    slice: TrailingSlice::new(4, 1),
                },
                SliceRule {
                    token_count: 10,
                    slice: TrailingSlice::new(4, 1),
                },
                SliceRule {
                    token_count: 9,
                    slice: TrailingSlice::new(4, 1),
                },
            ],
            molecule2_overrides: Vec::new(),
            molecule1_repairs: Vec::new(),
            molecule2_repairs: Vec::new(),
        }
    }

    /// Parse a correction table from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, Pdf2XyzError> {
        serde_json::from_str(json).map_err(|e| Pdf2XyzError::InvalidCorrections(e.to_string()))
    }

    /// Load a correction table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, Pdf2XyzError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Pdf2XyzError::InvalidCorrections(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Slice for a molecule-2 segment, or `None` when the token count is not
    /// covered by the table.
    pub fn molecule2_slice(&self, line_index: usize, token_count: usize) -> Option<TrailingSlice> {
        self.molecule2_overrides
            .iter()
            .find(|o| o.line_index == line_index && o.token_count == token_count)
            .map(|o| o.slice)
            .or_else(|| {
                self.molecule2_slices
                    .iter()
                    .find(|r| r.token_count == token_count)
                    .map(|r| r.slice)
            })
    }

    pub fn repair_molecule1(&self, line: &str) -> String {
        apply_first_repair(&self.molecule1_repairs, line)
    }

    pub fn repair_molecule2(&self, line: &str) -> String {
        apply_first_repair(&self.molecule2_repairs, line)
    }
}

fn apply_first_repair(repairs: &[SubstringRepair], line: &str) -> String {
    match repairs.iter().find(|r| line.contains(r.find.as_str())) {
        Some(r) => line.replace(r.find.as_str(), &r.replace),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slice() {
        let tokens = ["a", "b", "c", "d", "e", "f", "g"];
        assert_eq!(TrailingSlice::new(5, 1).apply(&tokens), ["b", "c", "d", "e", "f"]);
        assert_eq!(TrailingSlice::new(4, 0).apply(&tokens), ["d", "e", "f", "g"]);
        assert_eq!(TrailingSlice::new(10, 1).apply(&tokens).len(), 6);
    }

    #[test]
    fn test_override_takes_precedence() {
        let c = OcrCorrections::default();
        assert_eq!(c.molecule2_slice(61, 11), Some(TrailingSlice::new(5, 1)));
        assert_eq!(c.molecule2_slice(60, 11), Some(TrailingSlice::new(4, 1)));
        assert_eq!(c.molecule2_slice(2, 9), Some(TrailingSlice::new(4, 0)));
        assert_eq!(c.molecule2_slice(3, 9), Some(TrailingSlice::new(4, 1)));
        assert_eq!(c.molecule2_slice(0, 13), None);
    }

    #[test]
    fn test_none_has_no_overrides() {
        let c = OcrCorrections::none();
        assert_eq!(c.molecule2_slice(61, 11), Some(TrailingSlice::new(4, 1)));
        assert_eq!(c.repair_molecule2("0.97994288"), "0.97994288");
    }

    #[test]
    fn test_first_matching_repair_wins() {
        let c = OcrCorrections::default();
        assert_eq!(
            c.repair_molecule2("0.97994288 2.721697"),
            "0.979942885 2.721697"
        );
        assert_eq!(c.repair_molecule2("x 2.721697 y"), "x 2.7221697 y");
        assert_eq!(
            c.repair_molecule1("-3.008463%0 1.0 2.0 C"),
            "-3.008463360 1.0 2.0 C"
        );
    }

    #[test]
    fn test_json_partial_table_uses_defaults() {
        let c = OcrCorrections::from_json_str(r#"{ "molecule2_repairs": [] }"#).unwrap();
        assert!(c.molecule2_repairs.is_empty());
        assert_eq!(c.molecule1_repairs.len(), 1);
        assert_eq!(c.molecule2_overrides.len(), 2);
    }

    #[test]
    fn test_json_invalid() {
        let err = OcrCorrections::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Pdf2XyzError::InvalidCorrections(_)));
    }

    #[test]
    fn test_json_round_trip_of_default() {
        let json = serde_json::to_string(&OcrCorrections::default()).unwrap();
        assert_eq!(
            OcrCorrections::from_json_str(&json).unwrap(),
            OcrCorrections::default()
        );
    }
}

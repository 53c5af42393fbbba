//! OCR text segmentation: page text → header / body / footer, and body →
//! two molecule line sets.
//!
//! The scanned tables this path handles print two molecules side by side,
//! separated on every row by the `M001` column marker. The page also carries
//! a fixed-height header and footer band that must be cut away before the
//! rows can be tokenised.
//!
//! ## Known limitation
//!
//! Exactly two molecules per line are assumed. Documents with one, three, or
//! more molecules per row are not handled by [`split_molecules`].

use crate::error::LineError;
use crate::xyz::corrections::OcrCorrections;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Column marker separating the two molecules on a body line.
pub const COLUMN_DELIMITER: &str = "M001";

/// Characters deleted from body lines before tokenisation.
const DECORATIVE_CHARS: &[char] = &['«', '°', '=', '¥', '(', ')', '[', ']', '#', '?', '~', '©'];

static RE_DELIMITER_MISREAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[M¥\\/][0OQ][0OQ][1Il!|]").unwrap());

static RE_NEG_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-−–—]\s*").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fixed-height bands cut from the top and bottom of an OCR page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrLayout {
    /// Lines in the header band. Default: 6.
    pub header_lines: usize,
    /// Lines in the footer band. Default: 6.
    pub footer_lines: usize,
    /// Lines between the body and the footer that belong to neither. Default: 1.
    pub footer_gap: usize,
}

impl Default for OcrLayout {
    fn default() -> Self {
        Self {
            header_lines: 6,
            footer_lines: 6,
            footer_gap: 1,
        }
    }
}

/// A page split into its three bands. Body lines are cleaned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentedText {
    pub header: Vec<String>,
    pub body: Vec<String>,
    pub footer: Vec<String>,
}

/// The two molecule line sets recovered from a body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitBody {
    pub molecule1: Vec<String>,
    pub molecule2: Vec<String>,
    /// Body lines that could not be split, with the reason.
    pub skipped: Vec<LineError>,
}

/// Rewrite misread column markers (`¥OO1`, `MOQl`, `\00|`, ...) to `M001`.
pub fn repair_delimiters(text: &str, corrections: &OcrCorrections) -> String {
    let mut s = RE_DELIMITER_MISREAD
        .replace_all(text, COLUMN_DELIMITER)
        .into_owned();
    for alias in &corrections.delimiter_aliases {
        s = s.replace(alias.as_str(), COLUMN_DELIMITER);
    }
    s
}

/// Split raw OCR text into header, cleaned body, and footer.
///
/// Short pages that cannot hold both bands yield an empty body; header and
/// footer may then overlap.
pub fn segment_ocr_text(text: &str, layout: &OcrLayout, corrections: &OcrCorrections) -> SegmentedText {
    let collapsed: Vec<String> = text
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .map(|line| repair_delimiters(&line, corrections))
        .collect();

    let n = collapsed.len();
    let header = collapsed[..layout.header_lines.min(n)].to_vec();
    let footer = collapsed[n.saturating_sub(layout.footer_lines)..].to_vec();

    let body_end = n.saturating_sub(layout.footer_lines + layout.footer_gap);
    let body = if layout.header_lines < body_end {
        collapsed[layout.header_lines..body_end]
            .iter()
            .map(|line| clean_body_line(line))
            .collect()
    } else {
        Vec::new()
    };

    debug!(
        "Segmented OCR text: {} header, {} body, {} footer lines",
        header.len(),
        body.len(),
        footer.len()
    );

    SegmentedText { header, body, footer }
}

/// Strip decorative glyphs, unify minus signs, and collapse whitespace.
pub fn clean_body_line(line: &str) -> String {
    let s: String = line.chars().filter(|c| !DECORATIVE_CHARS.contains(c)).collect();
    let s = RE_NEG_SIGN.replace_all(s.trim(), "-");
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Split each body line at the column marker into two molecule line sets.
///
/// Molecule 1 keeps its segment minus the leading row descriptors and the
/// trailing token. Molecule 2 segments vary in token count from OCR noise;
/// the correction table decides which trailing tokens to keep. Digit repairs
/// are applied last.
pub fn split_molecules(body: &[String], corrections: &OcrCorrections) -> SplitBody {
    let mut out = SplitBody::default();

    for (index, line) in body.iter().enumerate() {
        let mut parts = line.split(COLUMN_DELIMITER);
        let (left, right) = match (parts.next(), parts.next()) {
            (Some(left), Some(right)) => (left, right),
            _ => {
                warn!("Body line {}: no column marker, skipped: {}", index, line);
                out.skipped.push(LineError::MissingDelimiter {
                    index,
                    line: line.clone(),
                });
                continue;
            }
        };

        let left_tokens: Vec<&str> = left.split_whitespace().collect();
        let end = left_tokens
            .len()
            .saturating_sub(corrections.molecule1_drop_trailing);
        let start = corrections.molecule1_drop_leading.min(end);
        let molecule1 = left_tokens[start..end].join(" ");
        out.molecule1.push(corrections.repair_molecule1(&molecule1));

        let right_tokens: Vec<&str> = right.split_whitespace().collect();
        match corrections.molecule2_slice(index, right_tokens.len()) {
            Some(slice) => {
                let molecule2 = slice.apply(&right_tokens).join(" ");
                out.molecule2.push(corrections.repair_molecule2(&molecule2));
            }
            None => {
                warn!(
                    "Body line {}: {} tokens after column marker, skipped: {}",
                    index,
                    right_tokens.len(),
                    line
                );
                out.skipped.push(LineError::UnexpectedTokenCount {
                    index,
                    count: right_tokens.len(),
                    line: line.clone(),
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &[&str]) -> String {
        let mut lines: Vec<String> = (1..=6).map(|i| format!("header {i}")).collect();
        lines.extend(body.iter().map(|s| s.to_string()));
        lines.push("gap".into());
        lines.extend((1..=6).map(|i| format!("footer {i}")));
        lines.join("\n")
    }

    #[test]
    fn test_repair_delimiters() {
        let c = OcrCorrections::default();
        assert_eq!(repair_delimiters("a ¥OO1 b", &c), "a M001 b");
        assert_eq!(repair_delimiters("a MOQl b", &c), "a M001 b");
        assert_eq!(repair_delimiters(r"a \00| b", &c), "a M001 b");
        assert_eq!(repair_delimiters("a /0O! b", &c), "a M001 b");
        assert_eq!(repair_delimiters("a ¥O001 b", &c), "a M001 b");
        assert_eq!(repair_delimiters("a M001 b", &c), "a M001 b");
    }

    #[test]
    fn test_bands() {
        let text = page(&["row one", "row   two"]);
        let seg = segment_ocr_text(&text, &OcrLayout::default(), &OcrCorrections::default());
        assert_eq!(seg.header.len(), 6);
        assert_eq!(seg.header[0], "header 1");
        assert_eq!(seg.footer.len(), 6);
        assert_eq!(seg.footer[5], "footer 6");
        assert_eq!(seg.body, vec!["row one", "row two"]);
    }

    #[test]
    fn test_short_page_has_empty_body() {
        let seg = segment_ocr_text("a\nb\nc", &OcrLayout::default(), &OcrCorrections::default());
        assert!(seg.body.is_empty());
        assert_eq!(seg.header.len(), 3);
        assert_eq!(seg.footer.len(), 3);
    }

    #[test]
    fn test_clean_body_line() {
        assert_eq!(clean_body_line("  (1) « 2.5 °  −  3.1 ~"), "1 2.5 -3.1");
        assert_eq!(clean_body_line("a —  0.5 [b]"), "a -0.5 b");
        assert_eq!(clean_body_line("x = y © z"), "x y z");
    }

    #[test]
    fn test_split_molecules_basic() {
        let body = vec![
            "1 46 -1.332314000 0.071934000 0.041918000 Pd 0 M001 2 15 a b c -3.633249000 0.002904000 0.027078000 P 0"
                .to_string(),
        ];
        let split = split_molecules(&body, &OcrCorrections::none());
        assert_eq!(split.molecule1, vec!["-1.332314000 0.071934000 0.041918000 Pd"]);
        assert_eq!(split.molecule2, vec!["-3.633249000 0.002904000 0.027078000 P"]);
        assert!(split.skipped.is_empty());
    }

    #[test]
    fn test_split_twelve_tokens_keeps_fragment() {
        let body = vec![
            "1 1 1.0 2.0 3.0 C 0 M001 a b c d e f 1.234 567890 2.345678901 3.456789012 N 7".to_string(),
        ];
        let split = split_molecules(&body, &OcrCorrections::none());
        assert_eq!(split.molecule2, vec!["1.234 567890 2.345678901 3.456789012 N"]);
    }

    #[test]
    fn test_split_reports_bad_lines() {
        let body = vec![
            "no marker here".to_string(),
            "1 1 1.0 2.0 3.0 C 0 M001 too few".to_string(),
        ];
        let split = split_molecules(&body, &OcrCorrections::none());
        assert_eq!(split.molecule1, vec!["1.0 2.0 3.0 C"]);
        assert!(split.molecule2.is_empty());
        assert!(matches!(
            split.skipped[0],
            LineError::MissingDelimiter { index: 0, .. }
        ));
        assert!(matches!(
            split.skipped[1],
            LineError::UnexpectedTokenCount { index: 1, count: 2, .. }
        ));
    }

    #[test]
    fn test_split_applies_index_override_and_repairs() {
        let mut body: Vec<String> = (0..3)
            .map(|_| "1 1 1.0 2.0 3.0 C 0 M001 a b c d e 1.0 2.0 3.0 O".to_string())
            .collect();
        body[2] = "1 1 -3.008463%0 2.0 3.0 C 0 M001 a b c d e 0.97994288 2.0 3.0 O".to_string();

        let split = split_molecules(&body, &OcrCorrections::default());
        assert_eq!(split.molecule2[0], "e 1.0 2.0 3.0");
        assert_eq!(split.molecule2[2], "0.979942885 2.0 3.0 O");
        assert_eq!(split.molecule1[2], "-3.008463360 2.0 3.0 C");
    }
}

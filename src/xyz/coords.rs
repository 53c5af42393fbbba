//! Coordinate extraction from clean (non-OCR) PDF text.
//!
//! Text extracted directly from a PDF keeps its digits intact but loses the
//! table structure. Coordinate rows are recognised by pattern, and molecules
//! are the maximal runs of consecutive lines that contain at least one row.
//!
//! ## Row grammar
//!
//! ```text
//! row    := atom sep number sep number sep number
//! sep    := [ \t]*
//! atom   := [A-Z][a-z]?[0-9]*          element symbol, optional label digits
//!         | [0-9]{1,2}                 atomic number
//! number := -?[0-9]\.[0-9]* sep [eE] sep -?[0-9]*     exponential
//!         | -?[0-9]\.[0-9]*                             decimal
//! ```
//!
//! A line may hold several rows side by side (multi-column layouts); every
//! non-overlapping match is taken, left to right.

use crate::error::{LineError, Pdf2XyzError};
use crate::xyz::molecule::AtomRecord;
use crate::xyz::periodic::PeriodicTable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

const NUMBER: &str = r"-?[0-9]\.[0-9]*[ \t]*[eE][ \t]*-?[0-9]*|-?[0-9]\.[0-9]*";

static RE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:(?P<symbol>[A-Z][a-z]?[0-9]*)|(?P<number>[0-9]{{1,2}}))[ \t]*(?P<x>{NUMBER})[ \t]*(?P<y>{NUMBER})[ \t]*(?P<z>{NUMBER})"
    ))
    .unwrap()
});

/// How the atom was written in the source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtomToken {
    /// Element symbol, possibly with a numeric label (`C12`).
    Symbol(String),
    /// Atomic number (`6`).
    AtomicNumber(u32),
}

/// One pattern match, before atomic numbers are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMatch {
    /// The matched text, verbatim.
    pub text: String,
    pub atom: AtomToken,
    /// The atom field as written (`06`, `C12`).
    pub atom_text: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

/// A coordinate row ready for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateRow {
    /// The matched text with any atomic number replaced by its symbol.
    pub text: String,
    pub element: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

impl CoordinateRow {
    /// Convert into an [`AtomRecord`]. Blanks inside exponential numbers
    /// (`3.1e -05`) are removed first.
    pub fn to_atom(&self) -> Result<AtomRecord, LineError> {
        let compact = |s: &str| s.replace([' ', '\t'], "");
        AtomRecord::from_strs(
            self.element.clone(),
            compact(&self.x),
            compact(&self.y),
            compact(&self.z),
        )
        .ok_or_else(|| LineError::UnparseableCoordinate {
            line: self.text.clone(),
        })
    }
}

/// Find every coordinate row on a single line.
pub fn match_coordinate_rows(line: &str) -> Vec<RowMatch> {
    RE_ROW
        .captures_iter(line)
        .filter_map(|caps| {
            let (atom, atom_text) = match (caps.name("symbol"), caps.name("number")) {
                (Some(sym), _) => (AtomToken::Symbol(sym.as_str().to_string()), sym.as_str()),
                (None, Some(num)) => {
                    (AtomToken::AtomicNumber(num.as_str().parse().ok()?), num.as_str())
                }
                (None, None) => return None,
            };
            Some(RowMatch {
                text: caps[0].to_string(),
                atom,
                atom_text: atom_text.to_string(),
                x: caps["x"].to_string(),
                y: caps["y"].to_string(),
                z: caps["z"].to_string(),
            })
        })
        .collect()
}

/// Resolve the atom token of a match, rewriting atomic numbers in place.
pub fn resolve_row(row: RowMatch, table: &dyn PeriodicTable) -> Result<CoordinateRow, Pdf2XyzError> {
    match row.atom {
        AtomToken::Symbol(symbol) => Ok(CoordinateRow {
            text: row.text,
            element: symbol,
            x: row.x,
            y: row.y,
            z: row.z,
        }),
        AtomToken::AtomicNumber(number) => {
            let symbol = table.symbol(number)?.to_string();
            let text = row.text.replacen(&row.atom_text, &symbol, 1);
            Ok(CoordinateRow {
                text,
                element: symbol,
                x: row.x,
                y: row.y,
                z: row.z,
            })
        }
    }
}

/// Split text into molecules: maximal runs of consecutive matching lines.
///
/// An unknown atomic number aborts the whole extraction.
pub fn extract_coordinate_blocks(
    text: &str,
    table: &dyn PeriodicTable,
) -> Result<Vec<Vec<CoordinateRow>>, Pdf2XyzError> {
    let mut blocks = Vec::new();
    let mut current: Vec<CoordinateRow> = Vec::new();

    for line in text.split('\n') {
        let rows = match_coordinate_rows(line);
        if rows.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        for row in rows {
            current.push(resolve_row(row, table)?);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    debug!("Found {} coordinate blocks", blocks.len());
    Ok(blocks)
}

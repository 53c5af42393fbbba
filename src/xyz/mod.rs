//! Coordinate recovery core: noisy text in, [`Molecule`]s out.
//!
//! Everything in this module is synchronous and free of I/O except
//! [`writer::write_xyz_file`]. The async drivers in [`crate::convert`] feed it
//! text from pdfium, an OCR engine, or an LLM cleanup pass.
//!
//! ```text
//!   OCR text ──► segment ──► tokenize ──┐
//!                 (corrections)   │     │
//!                         number ◄┤     ├──► Molecule ──► writer
//!                        element ◄┘     │
//!   PDF text ──► coords ────────────────┘
//!                (periodic)
//! ```

pub mod coords;
pub mod corrections;
pub mod element;
pub mod molecule;
pub mod number;
pub mod periodic;
pub mod segment;
pub mod tokenize;
pub mod writer;

pub use coords::{extract_coordinate_blocks, match_coordinate_rows, CoordinateRow};
pub use corrections::OcrCorrections;
pub use element::correct_element_symbol;
pub use molecule::{AtomRecord, Molecule};
pub use number::{normalize_number, parse_number, NormalizedNumber};
pub use periodic::{PeriodicTable, StandardPeriodicTable};
pub use segment::{segment_ocr_text, split_molecules, OcrLayout, SegmentedText, SplitBody};
pub use tokenize::{tokenize_line, ElementPosition, TokenizerPolicy};
pub use writer::{to_xyz_string, write_xyz, write_xyz_file};

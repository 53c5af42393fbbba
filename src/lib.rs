//! # pdf2xyz
//!
//! Recover molecular coordinates from chemistry PDFs and write them as XYZ
//! files.
//!
//! ## Why this crate?
//!
//! Supporting-information PDFs publish optimised geometries as tables, often
//! as scanned images. Copying them by hand is slow and error-prone. This
//! crate reads the table, through the PDF text layer when there is one or
//! through OCR when there is not, repairs the typical OCR damage (split
//! numbers, misread minus signs, `0` for `O`), and emits one `.xyz` file per
//! molecule.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the file and its PDF header
//!  ├─ 2. Text      pdfium text layer (text mode)
//!  │               or render → Tesseract / vision model (ocr mode)
//!  ├─ 3. Cleanup   optional LLM pass: isolate, clean, or separate molecules
//!  ├─ 4. Parse     coordinate-row pattern, or the two-column OCR segmenter
//!  │               with per-line tokenisation and correction tables
//!  └─ 5. Output    one Molecule per table → <name>.xyz
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2xyz::{convert_to_dir, ExtractionConfig, ExtractionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .mode(ExtractionMode::Ocr)
//!         .build()?;
//!     let (output, files) = convert_to_dir("si.pdf", "out/", &config).await?;
//!     eprintln!("{} molecules, {} lines skipped",
//!         output.stats.molecule_count,
//!         output.stats.skipped_line_count);
//!     for f in files {
//!         println!("{}", f.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Text that is already at hand skips the PDF stage entirely:
//!
//! ```rust
//! use pdf2xyz::{extract_from_text, StandardPeriodicTable};
//!
//! let out = extract_from_text("C 0.0 0.0 0.0\nO 1.2 0.0 0.0", &StandardPeriodicTable).unwrap();
//! assert_eq!(out.molecules[0].to_xyz(), "2\n\nC\t0.0\t0.0\t0.0\nO\t1.2\t0.0\t0.0\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `cli`       | on      | Enables the `pdf2xyz` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `tesseract` | off     | Local OCR through Tesseract (leptess); needs libtesseract and leptonica |
//!
//! Without `tesseract`, OCR mode uses a vision-capable LLM, resolved the same
//! way as the cleanup provider.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod xyz;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, ExtractionMode, PageSelection};
pub use convert::{
    convert, convert_sync, convert_to_dir, extract_from_ocr_text, extract_from_separated_text,
    extract_from_text, resolve_provider,
};
pub use error::{LineError, PageError, Pdf2XyzError};
pub use output::{ExtractionOutput, ExtractionStats};
pub use pipeline::ocr::{OcrEngine, OcrText};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::CleanupRole;
pub use xyz::{
    AtomRecord, ElementPosition, Molecule, OcrCorrections, OcrLayout, PeriodicTable,
    StandardPeriodicTable, TokenizerPolicy,
};

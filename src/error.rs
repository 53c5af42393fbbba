//! Error types for the pdf2xyz library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`Pdf2XyzError`]: **Fatal**: the document cannot be processed at all
//!   (bad input file, wrong password, unknown atomic number, provider not
//!   configured). Returned as `Err(Pdf2XyzError)` from the `convert*`
//!   functions.
//!
//! * [`PageError`]: **Non-fatal**: one page could not be rendered, OCR'd, or
//!   cleaned, but the other pages are fine. Collected in
//!   [`crate::output::ExtractionOutput::page_errors`].
//!
//! * [`LineError`]: **Non-fatal**: one text line could not be turned into an
//!   atom. Logged and collected in
//!   [`crate::output::ExtractionOutput::skipped_lines`]; the rest of the
//!   molecule is kept.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2xyz library.
#[derive(Debug, Error)]
pub enum Pdf2XyzError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium returned an error while rendering a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// pdfium could not extract the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine returned an error.
    #[error("OCR failed for page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// No OCR engine is available for OCR mode.
    #[error("No OCR engine available: {0}")]
    OcrUnavailable(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error after all retries.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// An LLM call timed out.
    #[error("LLM call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Every selected page failed; there is no text to parse.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// An atomic number has no entry in the periodic table.
    #[error("Unknown atomic number {number}")]
    UnknownAtomicNumber { number: u32 },

    /// The document produced no molecules at all.
    #[error("No coordinates found in '{path}'")]
    NoCoordinatesFound { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output XYZ file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An OCR correction table could not be read or parsed.
    #[error("Invalid correction table: {0}")]
    InvalidCorrections(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A text line that could not be turned into an atom.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum LineError {
    /// The line has no tokens.
    #[error("empty line")]
    EmptyLine,

    /// The element token corrected to an empty symbol.
    #[error("no element symbol in '{token}' (line: {line})")]
    EmptyElement { line: String, token: String },

    /// The line did not yield exactly three coordinates.
    #[error("expected 3 coordinates, found {found} (line: {line})")]
    FieldCountMismatch { line: String, found: usize },

    /// An OCR body line has no column marker between the two molecules.
    #[error("body line {index}: no column marker (line: {line})")]
    MissingDelimiter { index: usize, line: String },

    /// The molecule-2 segment has a token count the correction table does
    /// not cover.
    #[error("body line {index}: unexpected token count {count} (line: {line})")]
    UnexpectedTokenCount {
        index: usize,
        count: usize,
        line: String,
    },

    /// A matched coordinate row holds a number that does not parse.
    #[error("unparseable coordinate (line: {line})")]
    UnparseableCoordinate { line: String },
}

/// A non-fatal error for a single page.
///
/// The extraction continues with the remaining pages.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine failed on this page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// LLM cleanup failed after retries; the raw text was used instead.
    #[error("Page {page}: cleanup failed after {retries} retries: {detail}")]
    CleanupFailed {
        page: usize,
        retries: u32,
        detail: String,
    },
}

impl PageError {
    /// Whether the page produced no text at all.
    ///
    /// A failed cleanup still leaves the raw OCR text, which is parsed.
    pub fn is_page_lost(&self) -> bool {
        matches!(self, Self::RenderFailed { .. } | Self::OcrFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_render_and_ocr_failures_lose_the_page() {
        let render = PageError::RenderFailed { page: 1, detail: "oom".into() };
        let ocr = PageError::OcrFailed { page: 2, detail: "timeout".into() };
        let cleanup = PageError::CleanupFailed { page: 3, retries: 3, detail: "429".into() };
        assert!(render.is_page_lost());
        assert!(ocr.is_page_lost());
        assert!(!cleanup.is_page_lost());
    }

    #[test]
    fn unknown_atomic_number_display() {
        let e = Pdf2XyzError::UnknownAtomicNumber { number: 0 };
        assert_eq!(e.to_string(), "Unknown atomic number 0");
    }

    #[test]
    fn api_timeout_display() {
        let e = Pdf2XyzError::ApiTimeout { elapsed_ms: 5000 };
        assert!(e.to_string().contains("5000ms"));
    }

    #[test]
    fn field_count_display() {
        let e = LineError::FieldCountMismatch {
            line: "C 1.0 2.0".into(),
            found: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("found 2"), "got: {msg}");
        assert!(msg.contains("C 1.0 2.0"), "got: {msg}");
    }

    #[test]
    fn line_error_serialises() {
        let e = LineError::MissingDelimiter {
            index: 4,
            line: "abc".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("MissingDelimiter"));
        let back: LineError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn cleanup_failed_display() {
        let e = PageError::CleanupFailed {
            page: 2,
            retries: 3,
            detail: "503".into(),
        };
        assert!(e.to_string().contains("Page 2"));
        assert!(e.to_string().contains("3 retries"));
    }
}

//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the document. The CLI uses this to
//! drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use pdf2xyz::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct AtomCounter {
//!     atoms: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for AtomCounter {
//!     fn on_molecule_found(&self, _name: &str, atom_count: usize) {
//!         self.atoms.fetch_add(atom_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(AtomCounter { atoms: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// Implementations must be `Send + Sync`: in OCR mode pages are processed
/// concurrently, so page events may arrive from several tasks at once. All
/// methods have no-op defaults.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any page is processed.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when work on a page begins (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's text is ready for parsing.
    ///
    /// * `text_len`: byte length of the page text after cleanup
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page fails and is left out of the result.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called for each molecule, in output order, once parsing is done.
    fn on_molecule_found(&self, name: &str, atom_count: usize) {
        let _ = (name, atom_count);
    }

    /// Called once after every page has been attempted.
    fn on_extraction_complete(&self, molecule_count: usize, skipped_lines: usize) {
        let _ = (molecule_count, skipped_lines);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        atoms: AtomicUsize,
        molecules: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_molecule_found(&self, _name: &str, atom_count: usize) {
            self.atoms.fetch_add(atom_count, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, molecule_count: usize, _skipped_lines: usize) {
            self.molecules.store(molecule_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 42);
        cb.on_page_error(2, 5, "some error");
        cb.on_molecule_found("molecule1_ocr", 3);
        cb.on_extraction_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "OCR failed");
        tracker.on_molecule_found("molecule1_ocr", 61);
        tracker.on_molecule_found("molecule2_ocr", 60);
        tracker.on_extraction_complete(2, 4);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.atoms.load(Ordering::SeqCst), 121);
        assert_eq!(tracker.molecules.load(Ordering::SeqCst), 2);
    }
}

//! Pipeline stages around the coordinate-recovery core.
//!
//! Each submodule implements one step, so each is testable on its own and
//! the OCR engine or LLM provider can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ render::extract_text ──────────────────┐
//! input ─────┤                                          ├─▶ llm (cleanup) ─▶ postprocess ─▶ crate::xyz
//!            └─▶ render::render_page ─▶ encode ─▶ ocr ──┘
//! ```
//!
//! 1. [`input`]: validate the path and PDF magic bytes
//! 2. [`render`]: pdfium text layer or per-page rasterisation; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: PNG bytes, base64-wrapped for vision models
//! 4. [`ocr`]: Tesseract or a vision model behind [`ocr::OcrEngine`]
//! 5. [`llm`]: optional cleanup pass with retry/backoff
//! 6. [`postprocess`]: strip model artefacts; split named blocks

pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod render;

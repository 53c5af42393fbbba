//! Configuration types for PDF-to-XYZ extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The text-level knobs (OCR layout,
//! tokenizer policy, correction table) are plain serde types so a tuned setup
//! can be stored next to the documents it was tuned for.

use crate::error::Pdf2XyzError;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use crate::prompts::CleanupRole;
use crate::xyz::corrections::OcrCorrections;
use crate::xyz::segment::OcrLayout;
use crate::xyz::tokenize::TokenizerPolicy;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a PDF-to-XYZ extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2xyz::{ExtractionConfig, ExtractionMode};
///
/// let config = ExtractionConfig::builder()
///     .mode(ExtractionMode::Ocr)
///     .ocr_scale(6.0)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Where the text comes from. Default: [`ExtractionMode::Text`].
    pub mode: ExtractionMode,

    /// Render scale for OCR, as a multiple of the page's point size. Range:
    /// 1–12. Default: 8.
    ///
    /// Scanned tables use small fonts; Tesseract needs glyphs well above
    /// 20 px high to separate `0`, `O`, and `Q` reliably.
    pub ocr_scale: f32,

    /// OCR engine used in [`ExtractionMode::Ocr`]. If None, Tesseract is used
    /// when the `tesseract` feature is enabled, otherwise a vision model via
    /// the configured LLM provider.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Tesseract language data to load. Default: "eng".
    pub ocr_language: String,

    /// LLM cleanup applied to raw text before parsing. Default: None.
    pub cleanup: Option<CleanupRole>,

    /// LLM model identifier. Default: "gpt-4o-mini".
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for LLM calls. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 8192.
    ///
    /// A page of two 60-atom molecules is roughly 5 000 tokens of output.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Header/footer bands cut from OCR pages.
    pub layout: OcrLayout,

    /// Line tokenizer knobs.
    pub tokenizer: TokenizerPolicy,

    /// Document-specific OCR patches. Default: [`OcrCorrections::default()`].
    pub corrections: OcrCorrections,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Number of pages OCR'd concurrently. Default: 4.
    pub concurrency: usize,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            ocr_scale: 8.0,
            ocr_engine: None,
            ocr_language: "eng".to_string(),
            cleanup: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            password: None,
            layout: OcrLayout::default(),
            tokenizer: TokenizerPolicy::default(),
            corrections: OcrCorrections::default(),
            pages: PageSelection::default(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("mode", &self.mode)
            .field("ocr_scale", &self.ocr_scale)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|e| e.name()))
            .field("ocr_language", &self.ocr_language)
            .field("cleanup", &self.cleanup)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("layout", &self.layout)
            .field("tokenizer", &self.tokenizer)
            .field("pages", &self.pages)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The LLM model to use, falling back to the default.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Whether any step of this configuration needs an LLM provider.
    pub fn needs_llm(&self) -> bool {
        self.cleanup.is_some()
            || (self.mode == ExtractionMode::Ocr
                && self.ocr_engine.is_none()
                && !cfg!(feature = "tesseract"))
    }
}

/// Default LLM model for cleanup and vision OCR.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn ocr_scale(mut self, scale: f32) -> Self {
        self.config.ocr_scale = scale;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn ocr_language(mut self, language: impl Into<String>) -> Self {
        self.config.ocr_language = language.into();
        self
    }

    pub fn cleanup(mut self, role: CleanupRole) -> Self {
        self.config.cleanup = Some(role);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn layout(mut self, layout: OcrLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn tokenizer(mut self, policy: TokenizerPolicy) -> Self {
        self.config.tokenizer = policy;
        self
    }

    pub fn corrections(mut self, corrections: OcrCorrections) -> Self {
        self.config.corrections = corrections;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2XyzError> {
        let c = &self.config;
        if !(1.0..=12.0).contains(&c.ocr_scale) {
            return Err(Pdf2XyzError::InvalidConfig(format!(
                "OCR scale must be 1–12, got {}",
                c.ocr_scale
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2XyzError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.tokenizer.merge_digit_threshold == 0 {
            return Err(Pdf2XyzError::InvalidConfig(
                "Merge digit threshold must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where the coordinate text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// The PDF's own text layer, parsed with the coordinate-row pattern.
    /// (default)
    #[default]
    Text,
    /// Rendered pages run through an OCR engine, parsed with the two-column
    /// segmenter.
    Ocr,
}

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Parse a CLI page spec: `"3"`, `"2-5"`, or `"1,3,7"`.
    pub fn parse(spec: &str) -> Result<Self, Pdf2XyzError> {
        let bad = || Pdf2XyzError::InvalidConfig(format!("Invalid page selection '{spec}'"));
        let num = |s: &str| s.trim().parse::<usize>().map_err(|_| bad());

        let spec_trimmed = spec.trim();
        if spec_trimmed.is_empty() || spec_trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }
        if spec_trimmed.contains(',') {
            let pages = spec_trimmed.split(',').map(num).collect::<Result<_, _>>()?;
            return Ok(PageSelection::Set(pages));
        }
        if let Some((a, b)) = spec_trimmed.split_once('-') {
            let (a, b) = (num(a)?, num(b)?);
            if a > b {
                return Err(bad());
            }
            return Ok(PageSelection::Range(a, b));
        }
        Ok(PageSelection::Single(num(spec_trimmed)?))
    }
}

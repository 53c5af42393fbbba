//! OCR boundary: rendered page PNG → raw text.
//!
//! The segmenter downstream expects text laid out line-for-line like the
//! printed page, with interword spacing kept. Two engines provide that:
//!
//! * [`TesseractOcr`] (feature `tesseract`): local Tesseract via leptess, page
//!   segmentation mode 6 (single uniform block) with interword spaces kept.
//! * [`VisionOcr`]: a vision-capable LLM asked to transcribe the page.
//!
//! Callers can plug in any other engine by implementing [`OcrEngine`].

use crate::config::ExtractionConfig;
use crate::error::Pdf2XyzError;
use crate::pipeline::encode::to_image_data;
use crate::pipeline::llm::chat_with_retry;
use crate::pipeline::postprocess::clean_llm_output;
use crate::prompts::VISION_OCR_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, LLMProvider};
use std::sync::Arc;

/// Text recognised on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrText {
    pub text: String,
    /// Prompt tokens, for engines backed by an LLM.
    pub input_tokens: u64,
    /// Completion tokens, for engines backed by an LLM.
    pub output_tokens: u64,
}

impl OcrText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Anything that turns a page image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognise the text on one PNG-encoded page (`page_num` is 1-indexed).
    async fn recognize(&self, png: &[u8], page_num: usize) -> Result<OcrText, Pdf2XyzError>;
}

// ── Vision model ─────────────────────────────────────────────────────────

/// OCR through a vision-capable LLM.
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    config: ExtractionConfig,
}

impl VisionOcr {
    /// Uses the retry, timeout, and sampling settings of `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        let mut config = config.clone();
        config.ocr_engine = None;
        config.progress_callback = None;
        Self { provider, config }
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, png: &[u8], page_num: usize) -> Result<OcrText, Pdf2XyzError> {
        let messages = vec![
            ChatMessage::system(VISION_OCR_PROMPT),
            ChatMessage::user_with_images("", vec![to_image_data(png)]),
        ];
        let label = format!("Page {page_num} OCR");
        let reply = chat_with_retry(&self.provider, &messages, &self.config, &label).await?;
        Ok(OcrText {
            text: clean_llm_output(&reply.content),
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
        })
    }
}

// ── Tesseract ────────────────────────────────────────────────────────────

/// Local Tesseract OCR.
#[cfg(feature = "tesseract")]
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
}

#[cfg(feature = "tesseract")]
impl TesseractOcr {
    /// Check that Tesseract starts with `language` data (e.g. `"eng"`).
    pub fn new(language: impl Into<String>) -> Result<Self, Pdf2XyzError> {
        let language = language.into();
        leptess::LepTess::new(None, &language).map_err(|e| {
            Pdf2XyzError::OcrUnavailable(format!(
                "Tesseract failed to start with language '{language}': {e}"
            ))
        })?;
        Ok(Self { language })
    }

    fn recognize_blocking(language: &str, png: &[u8], page_num: usize) -> Result<String, Pdf2XyzError> {
        use leptess::{LepTess, Variable};

        let ocr_err = |detail: String| Pdf2XyzError::OcrFailed {
            page: page_num,
            detail,
        };

        let mut lt = LepTess::new(None, language)
            .map_err(|e| ocr_err(format!("Failed to initialize Tesseract: {e}")))?;
        lt.set_variable(Variable::TesseditPagesegMode, "6")
            .map_err(|e| ocr_err(format!("Failed to set PSM: {e}")))?;
        lt.set_variable(Variable::PreserveInterwordSpaces, "1")
            .map_err(|e| ocr_err(format!("Failed to preserve interword spaces: {e}")))?;
        lt.set_image_from_mem(png)
            .map_err(|e| ocr_err(format!("Failed to load page image: {e}")))?;
        lt.get_utf8_text()
            .map_err(|e| ocr_err(format!("Tesseract returned invalid UTF-8: {e}")))
    }
}

#[cfg(feature = "tesseract")]
#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, png: &[u8], page_num: usize) -> Result<OcrText, Pdf2XyzError> {
        let language = self.language.clone();
        let png = png.to_vec();
        let text = tokio::task::spawn_blocking(move || {
            Self::recognize_blocking(&language, &png, page_num)
        })
        .await
        .map_err(|e| Pdf2XyzError::Internal(format!("OCR task panicked: {e}")))??;
        Ok(OcrText::plain(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(&self, _png: &[u8], _page_num: usize) -> Result<OcrText, Pdf2XyzError> {
            Ok(OcrText::plain(self.0))
        }
    }

    #[tokio::test]
    async fn test_engine_is_object_safe() {
        let engine: Arc<dyn OcrEngine> = Arc::new(FixedOcr("C 1.0 2.0 3.0"));
        let out = engine.recognize(b"", 1).await.unwrap();
        assert_eq!(out.text, "C 1.0 2.0 3.0");
        assert_eq!(out.input_tokens, 0);
        assert_eq!(engine.name(), "fixed");
    }
}

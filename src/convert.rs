//! Extraction entry points.
//!
//! Two layers:
//!
//! * **Text level** ([`extract_from_ocr_text`], [`extract_from_text`],
//!   [`extract_from_separated_text`]): synchronous, no I/O. Feed them text
//!   from any source.
//! * **Document level** ([`convert`], [`convert_to_dir`], [`convert_sync`]):
//!   open a PDF, get its text through pdfium or OCR, optionally clean it with
//!   an LLM, then hand it to the text level.
//!
//! ## Which parser runs
//!
//! | Mode | Cleanup | Parser |
//! |------|---------|--------|
//! | `Text` | none / isolate / clean | coordinate-row pattern |
//! | `Text` | separate | named blocks, then coordinate-row pattern |
//! | `Ocr`  | none | two-column segmenter + tokenizer, per page |
//! | `Ocr`  | any role | as `Text` with that role, on the cleaned pages |
//!
//! The segmenter depends on the raw OCR line layout, which an LLM rewrite
//! does not preserve; cleaned OCR text therefore goes to the pattern parser.

use crate::config::{ExtractionConfig, ExtractionMode};
use crate::error::{LineError, PageError, Pdf2XyzError};
use crate::output::ExtractionOutput;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::postprocess::split_separated_blocks;
use crate::pipeline::{encode, input, llm, render};
use crate::prompts::CleanupRole;
use crate::xyz::coords::{extract_coordinate_blocks, CoordinateRow};
use crate::xyz::molecule::{AtomRecord, Molecule};
use crate::xyz::periodic::{PeriodicTable, StandardPeriodicTable};
use crate::xyz::segment::{segment_ocr_text, split_molecules};
use crate::xyz::tokenize::tokenize_line;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

// ── Text level ───────────────────────────────────────────────────────────

/// Parse one page of raw OCR text laid out as two molecules side by side.
///
/// Produces `molecule1_ocr` and `molecule2_ocr`. Lines that fail to split or
/// tokenize are logged and listed in `skipped_lines`.
pub fn extract_from_ocr_text(text: &str, config: &ExtractionConfig) -> ExtractionOutput {
    let mut output = ExtractionOutput::default();
    parse_ocr_page(text, config, "", &mut output);
    output.refresh_counts();
    output
}

/// Parse clean text with the coordinate-row pattern.
///
/// Each run of consecutive coordinate lines becomes `molecule_<idx>`. An
/// unknown atomic number fails the whole extraction.
pub fn extract_from_text(
    text: &str,
    table: &dyn PeriodicTable,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    let mut output = ExtractionOutput::default();
    for (idx, rows) in extract_coordinate_blocks(text, table)?.into_iter().enumerate() {
        let atoms = rows_to_atoms(&rows, &mut output.skipped_lines);
        push_molecule(&mut output, format!("molecule_{idx}"), atoms);
    }
    output.refresh_counts();
    Ok(output)
}

/// Parse `separate`-role output: star-separated blocks, each under a name
/// line.
///
/// Each block is one molecule named after its name line, or
/// `molecule_<idx>` when it has none.
pub fn extract_from_separated_text(
    text: &str,
    table: &dyn PeriodicTable,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    let mut output = ExtractionOutput::default();
    for block in split_separated_blocks(text) {
        let rows: Vec<CoordinateRow> = extract_coordinate_blocks(&block.text, table)?
            .into_iter()
            .flatten()
            .collect();
        let atoms = rows_to_atoms(&rows, &mut output.skipped_lines);
        let idx = output.molecules.len();
        let name = block.name.unwrap_or_else(|| format!("molecule_{idx}"));
        push_molecule(&mut output, name, atoms);
    }
    output.refresh_counts();
    Ok(output)
}

fn parse_ocr_page(text: &str, config: &ExtractionConfig, prefix: &str, output: &mut ExtractionOutput) {
    let segmented = segment_ocr_text(text, &config.layout, &config.corrections);
    let split = split_molecules(&segmented.body, &config.corrections);
    output.skipped_lines.extend(split.skipped);

    for (n, lines) in [(1, &split.molecule1), (2, &split.molecule2)] {
        let atoms = tokenize_lines(lines, config, &mut output.skipped_lines);
        push_molecule(output, format!("{prefix}molecule{n}_ocr"), atoms);
    }
}

fn tokenize_lines(
    lines: &[String],
    config: &ExtractionConfig,
    skipped: &mut Vec<LineError>,
) -> Vec<AtomRecord> {
    lines
        .iter()
        .filter_map(|line| match tokenize_line(line, &config.tokenizer) {
            Ok(atom) => Some(atom),
            Err(e) => {
                warn!("Skipping line: {}", e);
                skipped.push(e);
                None
            }
        })
        .collect()
}

fn rows_to_atoms(rows: &[CoordinateRow], skipped: &mut Vec<LineError>) -> Vec<AtomRecord> {
    rows.iter()
        .filter_map(|row| match row.to_atom() {
            Ok(atom) => Some(atom),
            Err(e) => {
                warn!("Skipping row: {}", e);
                skipped.push(e);
                None
            }
        })
        .collect()
}

fn push_molecule(output: &mut ExtractionOutput, name: String, atoms: Vec<AtomRecord>) {
    if atoms.is_empty() {
        debug!("{}: no atoms, not emitted", name);
        return;
    }
    debug!("{}: {} atoms", name, atoms.len());
    output.molecules.push(Molecule::new(name, atoms));
}

/// Parse text that went through (or skipped) an LLM cleanup role.
fn parse_clean_text(
    text: &str,
    role: Option<CleanupRole>,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    match role {
        Some(CleanupRole::Separate) => extract_from_separated_text(text, &StandardPeriodicTable),
        _ => extract_from_text(text, &StandardPeriodicTable),
    }
}

// ── Document level ───────────────────────────────────────────────────────

/// Extract every molecule from a PDF.
///
/// # Returns
/// `Ok(ExtractionOutput)` even if some pages or lines failed (check
/// `page_errors` and `skipped_lines`).
///
/// # Errors
/// Returns `Err(Pdf2XyzError)` only for fatal errors:
/// - File not found / not a PDF / wrong password
/// - An LLM or OCR engine is needed but cannot be set up
/// - Every page failed, or no coordinates were found at all
/// - An atomic number outside the periodic table
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    let total_start = Instant::now();
    info!("Starting extraction: {}", pdf_path.as_ref().display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_input(pdf_path)?;

    // ── Step 2: Select pages ─────────────────────────────────────────────
    let total_pages = render::page_count(&pdf_path, config.password.as_deref()).await?;
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(Pdf2XyzError::InvalidConfig(format!(
            "Page selection {:?} matches none of the {} pages",
            config.pages, total_pages
        )));
    }
    debug!("Selected {} of {} pages", page_indices.len(), total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(page_indices.len());
    }

    // ── Step 3: Provider, only when something needs it ───────────────────
    let provider = if config.needs_llm() {
        Some(resolve_provider(config).await?)
    } else {
        None
    };

    // ── Step 4: Text and parse ───────────────────────────────────────────
    let mut output = match config.mode {
        ExtractionMode::Text => {
            convert_text_layer(&pdf_path, &page_indices, provider.as_ref(), config).await?
        }
        ExtractionMode::Ocr => {
            convert_ocr(&pdf_path, &page_indices, provider.as_ref(), config).await?
        }
    };

    // ── Step 5: Stats ────────────────────────────────────────────────────
    output.stats.total_pages = total_pages;
    output.stats.failed_pages = output
        .page_errors
        .iter()
        .filter(|e| e.is_page_lost())
        .count();
    output.refresh_counts();
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    if output.molecules.is_empty() {
        return Err(Pdf2XyzError::NoCoordinatesFound { path: pdf_path });
    }

    if let Some(ref cb) = config.progress_callback {
        for molecule in &output.molecules {
            cb.on_molecule_found(&molecule.name, molecule.len());
        }
        cb.on_extraction_complete(output.molecules.len(), output.skipped_lines.len());
    }

    info!(
        "Extraction complete: {} molecules, {} atoms, {} skipped lines, {}ms",
        output.stats.molecule_count,
        output.stats.atom_count,
        output.stats.skipped_line_count,
        output.stats.total_duration_ms
    );

    Ok(output)
}

/// Extract every molecule and write one `<name>.xyz` per molecule into
/// `out_dir`.
///
/// Nothing is written unless the whole document was processed; a fatal
/// error leaves `out_dir` untouched.
pub async fn convert_to_dir(
    pdf_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(ExtractionOutput, Vec<PathBuf>), Pdf2XyzError> {
    let output = convert(pdf_path, config).await?;
    let written = output.write_to_dir(out_dir.as_ref())?;
    Ok((output, written))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2XyzError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

/// Text mode: pdfium text layer → optional cleanup → pattern parser.
async fn convert_text_layer(
    pdf_path: &Path,
    page_indices: &[usize],
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    let pages = render::extract_text(pdf_path, config.password.as_deref(), page_indices).await?;
    let total = page_indices.len();
    if let Some(ref cb) = config.progress_callback {
        for (idx, text) in &pages {
            cb.on_page_complete(idx + 1, total, text.len());
        }
    }

    let mut text = pages
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n");

    let (mut input_tokens, mut output_tokens) = (0, 0);
    if let (Some(role), Some(provider)) = (config.cleanup, provider) {
        let reply = llm::clean_text(provider, &text, role, config, "Document").await?;
        input_tokens = reply.input_tokens;
        output_tokens = reply.output_tokens;
        text = reply.content;
    }

    let mut output = parse_clean_text(&text, config.cleanup)?;
    output.stats.processed_pages = total;
    output.stats.total_input_tokens = input_tokens;
    output.stats.total_output_tokens = output_tokens;
    Ok(output)
}

/// Text recovered from one page in OCR mode.
struct OcrPage {
    idx: usize,
    text: Option<String>,
    errors: Vec<PageError>,
    input_tokens: u64,
    output_tokens: u64,
}

/// OCR mode: render → OCR (→ cleanup) per page, concurrently, then parse in
/// page order.
async fn convert_ocr(
    pdf_path: &Path,
    page_indices: &[usize],
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2XyzError> {
    let engine = resolve_ocr_engine(provider, config)?;
    info!("OCR engine: {}", engine.name());

    let total = page_indices.len();
    let mut pages: Vec<OcrPage> = stream::iter(page_indices.iter().map(|&idx| {
        let engine = Arc::clone(&engine);
        async move { ocr_page(pdf_path, idx, total, engine.as_ref(), provider, config).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    pages.sort_by_key(|p| p.idx);

    let mut output = ExtractionOutput::default();
    for page in &mut pages {
        output.page_errors.append(&mut page.errors);
        output.stats.total_input_tokens += page.input_tokens;
        output.stats.total_output_tokens += page.output_tokens;
    }

    let texts: Vec<(usize, String)> = pages
        .into_iter()
        .filter_map(|p| p.text.map(|t| (p.idx, t)))
        .collect();
    output.stats.processed_pages = texts.len();

    if texts.is_empty() {
        let first_error = output
            .page_errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Pdf2XyzError::AllPagesFailed { total, first_error });
    }

    if config.cleanup.is_some() {
        let joined = texts
            .into_iter()
            .map(|(_, t)| t)
            .collect::<Vec<_>>()
            .join("\n");
        let parsed = parse_clean_text(&joined, config.cleanup)?;
        output.molecules = parsed.molecules;
        output.skipped_lines = parsed.skipped_lines;
    } else {
        let multi_page = texts.len() > 1;
        for (idx, text) in &texts {
            let prefix = if multi_page {
                format!("page{}_", idx + 1)
            } else {
                String::new()
            };
            parse_ocr_page(text, config, &prefix, &mut output);
        }
    }

    Ok(output)
}

async fn ocr_page(
    pdf_path: &Path,
    idx: usize,
    total: usize,
    engine: &dyn OcrEngine,
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
) -> OcrPage {
    let page_num = idx + 1;
    let mut page = OcrPage {
        idx,
        text: None,
        errors: Vec::new(),
        input_tokens: 0,
        output_tokens: 0,
    };
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_page_start(page_num, total);
    }

    let fail = |page: &mut OcrPage, error: PageError| {
        warn!("{}", error);
        if let Some(cb) = cb {
            cb.on_page_error(page_num, total, &error.to_string());
        }
        page.errors.push(error);
    };

    let slot = render::acquire_render_slot().await;
    let image = match render::render_page(pdf_path, config.password.as_deref(), idx, config.ocr_scale).await {
        Ok(image) => image,
        Err(e) => {
            let detail = e.to_string();
            fail(&mut page, PageError::RenderFailed { page: page_num, detail });
            return page;
        }
    };
    let png = match encode::encode_png(&image) {
        Ok(png) => png,
        Err(e) => {
            let detail = format!("PNG encoding failed: {e}");
            fail(&mut page, PageError::RenderFailed { page: page_num, detail });
            return page;
        }
    };
    drop(image);
    drop(slot);

    let ocr = match engine.recognize(&png, page_num).await {
        Ok(ocr) => ocr,
        Err(e) => {
            fail(
                &mut page,
                PageError::OcrFailed {
                    page: page_num,
                    detail: e.to_string(),
                },
            );
            return page;
        }
    };
    page.input_tokens += ocr.input_tokens;
    page.output_tokens += ocr.output_tokens;
    let mut text = ocr.text;

    if let (Some(role), Some(provider)) = (config.cleanup, provider) {
        let label = format!("Page {page_num}");
        match llm::clean_text(provider, &text, role, config, &label).await {
            Ok(reply) => {
                page.input_tokens += reply.input_tokens;
                page.output_tokens += reply.output_tokens;
                text = reply.content;
            }
            Err(e) => {
                fail(
                    &mut page,
                    PageError::CleanupFailed {
                        page: page_num,
                        retries: config.max_retries,
                        detail: e.to_string(),
                    },
                );
                page.text = Some(text);
                return page;
            }
        }
    }

    if let Some(cb) = cb {
        cb.on_page_complete(page_num, total, text.len());
    }
    page.text = Some(text);
    page
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the OCR engine: configured engine, then Tesseract (feature
/// `tesseract`), then a vision model.
fn resolve_ocr_engine(
    provider: Option<&Arc<dyn LLMProvider>>,
    config: &ExtractionConfig,
) -> Result<Arc<dyn OcrEngine>, Pdf2XyzError> {
    if let Some(ref engine) = config.ocr_engine {
        return Ok(Arc::clone(engine));
    }

    #[cfg(feature = "tesseract")]
    let engine: Arc<dyn OcrEngine> = {
        let _ = provider;
        Arc::new(crate::pipeline::ocr::TesseractOcr::new(&config.ocr_language)?)
    };

    #[cfg(not(feature = "tesseract"))]
    let engine: Arc<dyn OcrEngine> = {
        let provider = provider.ok_or_else(|| {
            Pdf2XyzError::OcrUnavailable(
                "built without the `tesseract` feature and no LLM provider for vision OCR".into(),
            )
        })?;
        Arc::new(crate::pipeline::ocr::VisionOcr::new(Arc::clone(provider), config))
    };

    Ok(engine)
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2XyzError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2XyzError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub async fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<Arc<dyn LLMProvider>, Pdf2XyzError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2XyzError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xyz::tokenize::TokenizerPolicy;

    fn ocr_page_text(body: &[&str]) -> String {
        let mut lines: Vec<String> = (1..=6).map(|i| format!("Table S{i} header")).collect();
        lines.extend(body.iter().map(|s| s.to_string()));
        lines.push(String::new());
        lines.extend((1..=6).map(|i| format!("S{i}")));
        lines.join("\n")
    }

    #[test]
    fn test_ocr_text_two_molecules() {
        let text = ocr_page_text(&[
            "1 1 1.234567890 2.345678901 3.456789012 C 0 M001 2 15 a b c -3.008463360 0.071934123 0.041918456 P 0",
            "2 8 -1.234567890 0.345678901 1.456789012 O 0 M001 2 15 a b c 1.008463360 -0.071934123 0.541918456 H 0",
        ]);
        let out = extract_from_ocr_text(&text, &ExtractionConfig::default());
        assert_eq!(out.molecules.len(), 2);
        assert_eq!(out.molecules[0].name, "molecule1_ocr");
        assert_eq!(out.molecules[1].name, "molecule2_ocr");
        assert_eq!(out.molecules[0].atoms[1].element, "O");
        assert_eq!(out.molecules[1].atoms[0].element, "P");
        assert_eq!(out.molecules[1].atoms[0].x_str, "-3.008463360");
        assert_eq!(out.stats.atom_count, 4);
        assert!(out.skipped_lines.is_empty());
    }

    #[test]
    fn test_ocr_text_bad_lines_are_skipped() {
        let text = ocr_page_text(&[
            "1 1 1.234567890 2.345678901 3.456789012 C 0 M001 2 15 a b c -3.008463360 0.071934123 0.041918456 P 0",
            "garbage without a marker",
            "2 8 1.2 O 0 M001 2 15 a b c 1.008463360 -0.071934123 0.541918456 H 0",
        ]);
        let out = extract_from_ocr_text(&text, &ExtractionConfig::default());
        assert_eq!(out.molecules[0].len(), 1);
        assert_eq!(out.molecules[1].len(), 2);
        assert_eq!(out.stats.skipped_line_count, 2);
        assert!(matches!(out.skipped_lines[0], LineError::MissingDelimiter { index: 1, .. }));
        assert!(matches!(out.skipped_lines[1], LineError::FieldCountMismatch { found: 1, .. }));
    }

    #[test]
    fn test_ocr_text_six_decimal_table_needs_lower_threshold() {
        let text = ocr_page_text(&[
            "1 46 -1.332314 0.071934 0.041918 Pd 0 M001 2 15 a b c -3.633249 0.002904 0.027078 P 0",
        ]);
        let default_out = extract_from_ocr_text(&text, &ExtractionConfig::default());
        assert!(default_out.molecules.is_empty());
        assert_eq!(default_out.skipped_lines.len(), 2);

        let config = ExtractionConfig::builder()
            .tokenizer(TokenizerPolicy {
                merge_digit_threshold: 7,
                ..TokenizerPolicy::default()
            })
            .build()
            .unwrap();
        let out = extract_from_ocr_text(&text, &config);
        assert_eq!(out.molecules.len(), 2);
        assert_eq!(out.molecules[0].atoms[0].fields(), ["Pd", "-1.332314", "0.071934", "0.041918"]);
        assert_eq!(out.molecules[1].atoms[0].fields(), ["P", "-3.633249", "0.002904", "0.027078"]);
    }

    #[test]
    fn test_text_molecules_in_order() {
        let text = "Geometry 1\nC 0.0 0.0 0.0\nO 1.2 0.0 0.0\n\nGeometry 2\n7 0.0 0.0 0.0\n1 1.0 0.0 0.0\n";
        let out = extract_from_text(text, &StandardPeriodicTable).unwrap();
        assert_eq!(out.molecules.len(), 2);
        assert_eq!(out.molecules[0].name, "molecule_0");
        assert_eq!(out.molecules[1].name, "molecule_1");
        assert_eq!(out.molecules[1].atoms[0].element, "N");
        assert_eq!(out.molecules[1].atoms[1].element, "H");
    }

    #[test]
    fn test_text_unknown_atomic_number_is_fatal() {
        let err = extract_from_text("0 1.0 2.0 3.0", &StandardPeriodicTable).unwrap_err();
        assert!(matches!(err, Pdf2XyzError::UnknownAtomicNumber { number: 0 }));
    }

    #[test]
    fn test_separated_text_uses_block_names() {
        let text = "water\nO 0.0 0.0 0.1173\nH 0.0 0.7572 -0.4692\nH 0.0 -0.7572 -0.4692\n\
                    *******************\n\
                    C 0.0 0.0 0.0\n";
        let out = extract_from_separated_text(text, &StandardPeriodicTable).unwrap();
        assert_eq!(out.molecules.len(), 2);
        assert_eq!(out.molecules[0].name, "water");
        assert_eq!(out.molecules[0].len(), 3);
        assert_eq!(out.molecules[1].name, "molecule_1");
    }

    #[test]
    fn test_empty_text_gives_no_molecules() {
        let out = extract_from_text("", &StandardPeriodicTable).unwrap();
        assert!(out.molecules.is_empty());
        let out = extract_from_ocr_text("", &ExtractionConfig::default());
        assert!(out.molecules.is_empty());
    }
}

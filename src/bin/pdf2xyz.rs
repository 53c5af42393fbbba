//! CLI binary for pdf2xyz.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and writes one XYZ file per molecule.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2xyz::{
    convert, CleanupRole, ElementPosition, ExtractionConfig, ExtractionMode,
    ExtractionProgressCallback, OcrCorrections, PageSelection, ProgressCallback, TokenizerPolicy,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. Pages may complete out of order in OCR mode.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner only until `on_extraction_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let elapsed = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let elapsed = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_molecule_found(&self, name: &str, atom_count: usize) {
        self.bar
            .println(format!("  {} {:<24} {}", cyan("⬡"), name, dim(&format!("{atom_count} atoms"))));
    }

    fn on_extraction_complete(&self, molecule_count: usize, skipped_lines: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        let mark = if failed == 0 && skipped_lines == 0 {
            green("✔")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {} molecules  ({} lines skipped, {} pages failed)",
            mark,
            bold(&molecule_count.to_string()),
            skipped_lines,
            failed,
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Digital PDF: read the text layer, write XYZ files to ./
  pdf2xyz si.pdf

  # Scanned table, two molecules per row, files into out/
  pdf2xyz --mode ocr si_scan.pdf -o out/

  # Six-decimal tables need a lower merge threshold
  pdf2xyz --mode ocr --merge-threshold 7 si_scan.pdf -o out/

  # Let an LLM isolate and name each geometry before parsing
  pdf2xyz --cleanup separate --pages 12-20 si.pdf -o out/

  # Custom OCR correction table
  pdf2xyz --mode ocr --corrections fixes.json si_scan.pdf

  # Machine-readable summary (molecules, skipped lines, stats)
  pdf2xyz --json si.pdf -o out/ > report.json

OCR ENGINES:
  Built with --features tesseract, OCR runs locally through Tesseract.
  Otherwise each page is sent to a vision-capable LLM (see --model).

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory or file of an existing libpdfium
  RUST_LOG                Log filter, overrides --verbose / --quiet
"#;

/// Recover molecular XYZ coordinates from chemistry PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2xyz",
    version,
    about = "Recover molecular XYZ coordinates from chemistry PDFs",
    long_about = "Extract coordinate tables from digital or scanned chemistry PDFs and write one \
XYZ file per molecule. Text-layer parsing needs no API key; OCR and LLM cleanup use Tesseract or \
any provider supported by edgequake-llm.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Directory for the XYZ files (created if missing).
    #[arg(short, long, env = "PDF2XYZ_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Where the text comes from.
    #[arg(long, env = "PDF2XYZ_MODE", value_enum, default_value = "text")]
    mode: ModeArg,

    /// LLM cleanup pass before parsing.
    #[arg(long, env = "PDF2XYZ_CLEANUP", value_enum)]
    cleanup: Option<CleanupArg>,

    /// LLM model ID for cleanup and vision OCR (default: gpt-4o-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2XYZ_PAGES", default_value = "all")]
    pages: String,

    /// Render scale for OCR (1-12; 8 ≈ 576 DPI).
    #[arg(long, env = "PDF2XYZ_SCALE", default_value_t = 8.0)]
    scale: f32,

    /// Pages processed concurrently in OCR mode.
    #[arg(short, long, env = "PDF2XYZ_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Tesseract language code.
    #[arg(long, env = "PDF2XYZ_OCR_LANGUAGE", default_value = "eng")]
    ocr_language: String,

    /// JSON file with an OCR correction table.
    #[arg(long, env = "PDF2XYZ_CORRECTIONS", conflicts_with = "no_corrections")]
    corrections: Option<PathBuf>,

    /// Use layout rules only: no per-line overrides, no digit repairs.
    #[arg(long)]
    no_corrections: bool,

    /// Digits a numeric field must reach before token merging stops.
    #[arg(long, env = "PDF2XYZ_MERGE_THRESHOLD",
          value_parser = clap::value_parser!(u32).range(1..=30))]
    merge_threshold: Option<u32>,

    /// Where the element symbol sits on an OCR atom line.
    #[arg(long, env = "PDF2XYZ_ELEMENT_POSITION", value_enum, default_value = "auto")]
    element_position: PositionArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2XYZ_PASSWORD")]
    password: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDF2XYZ_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Retries per LLM call.
    #[arg(long, env = "PDF2XYZ_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDF2XYZ_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the extraction result as JSON on stdout.
    #[arg(long, env = "PDF2XYZ_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2XYZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2XYZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2XYZ_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Text,
    Ocr,
}

impl From<ModeArg> for ExtractionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Text => ExtractionMode::Text,
            ModeArg::Ocr => ExtractionMode::Ocr,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CleanupArg {
    Isolate,
    Clean,
    Separate,
}

impl From<CleanupArg> for CleanupRole {
    fn from(v: CleanupArg) -> Self {
        match v {
            CleanupArg::Isolate => CleanupRole::Isolate,
            CleanupArg::Clean => CleanupRole::Clean,
            CleanupArg::Separate => CleanupRole::Separate,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PositionArg {
    Auto,
    Trailing,
    Leading,
}

impl From<PositionArg> for ElementPosition {
    fn from(v: PositionArg) -> Self {
        match v {
            PositionArg::Auto => ElementPosition::Auto,
            PositionArg::Trailing => ElementPosition::Trailing,
            PositionArg::Leading => ElementPosition::Leading,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    // Files are written only once the whole document has been processed.
    let output = convert(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", cli.out_dir))?;
    let written = output
        .write_to_dir(&cli.out_dir)
        .context("Failed to write XYZ files")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        for path in &written {
            println!("{}", path.display());
        }
    }

    if !cli.quiet && !cli.json {
        let stats = &output.stats;
        if !show_progress {
            eprintln!(
                "Extracted {} molecules ({} atoms) from {}/{} pages in {}ms",
                stats.molecule_count,
                stats.atom_count,
                stats.processed_pages,
                stats.total_pages,
                stats.total_duration_ms
            );
            if stats.skipped_line_count > 0 {
                eprintln!("  {} lines skipped", stats.skipped_line_count);
            }
        }
        if stats.total_input_tokens + stats.total_output_tokens > 0 {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.total_input_tokens.to_string()),
                dim(&stats.total_output_tokens.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = PageSelection::parse(&cli.pages).context("Invalid --pages")?;

    let corrections = if cli.no_corrections {
        OcrCorrections::none()
    } else if let Some(ref path) = cli.corrections {
        OcrCorrections::from_json_file(path)
            .with_context(|| format!("Failed to load correction table from {:?}", path))?
    } else {
        OcrCorrections::default()
    };

    let mut tokenizer = TokenizerPolicy {
        element_position: cli.element_position.into(),
        ..TokenizerPolicy::default()
    };
    if let Some(threshold) = cli.merge_threshold {
        tokenizer.merge_digit_threshold = threshold as usize;
    }

    let mut builder = ExtractionConfig::builder()
        .mode(cli.mode.into())
        .ocr_scale(cli.scale)
        .ocr_language(cli.ocr_language.clone())
        .concurrency(cli.concurrency)
        .pages(pages)
        .corrections(corrections)
        .tokenizer(tokenizer)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(role) = cli.cleanup {
        builder = builder.cleanup(role.into());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

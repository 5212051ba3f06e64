//! CLI binary for scanlate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ProcessConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scanlate::{
    inspect, output_file_name, process, process_to_file, PageResult, ProcessConfig,
    ProcessProgressCallback, ProgressCallback, Stage, Tier,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn paint(code: &str, s: &str) -> String {
    format!("\x1b[{code}m{s}\x1b[0m")
}
fn green(s: &str) -> String {
    paint("32", s)
}
fn red(s: &str) -> String {
    paint("31", s)
}
fn yellow(s: &str) -> String {
    paint("33", s)
}
fn dim(s: &str) -> String {
    paint("2", s)
}
fn bold(s: &str) -> String {
    paint("1", s)
}
fn cyan(s: &str) -> String {
    paint("36", s)
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif]. Pages run strictly in order, so a single
/// current-page timer is enough.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the page currently in flight.
    page_start: Mutex<Option<Instant>>,
    /// Count of pages that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback showing a plain spinner; the bar itself appears in
    /// `on_document_start` once the page count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.set_message("opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(100));

        Arc::new(Self {
            bar,
            page_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Swap the spinner for the real progress bar once `total` is known.
    fn activate_bar(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] \
                 {pos:>3}/{len} pages  {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
        );
        self.bar.set_prefix("Processing");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.page_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual page count.
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting processing of {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        *self.page_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_stage_start(&self, page_num: usize, _total: usize, stage: Stage) {
        self.bar.set_message(format!("page {page_num} · {stage}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, result: &PageResult) {
        let status = if !result.translated_text.is_empty() {
            dim(&format!("{:>5} chars", result.translated_text.len()))
        } else if !result.ocr_text.is_empty() {
            yellow("ocr only")
        } else {
            yellow("no text")
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            status,
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep long API error bodies to one tidy line.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, total_pages: usize, translated_pages: usize, tier: Tier) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        match tier {
            Tier::Translated if failed == 0 => eprintln!(
                "{} {} pages translated",
                green("✔"),
                bold(&translated_pages.to_string())
            ),
            Tier::Translated => eprintln!(
                "{} {}/{} pages translated  ({} failed)",
                cyan("⚠"),
                bold(&translated_pages.to_string()),
                total_pages,
                red(&failed.to_string()),
            ),
            Tier::Raw => eprintln!(
                "{} no page translated, fell back to the embedded text layer",
                yellow("⚠"),
            ),
            Tier::None => eprintln!("{} no text could be extracted", red("✘")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic processing (stdout)
  scanlate book.pdf

  # Write to a file
  scanlate book.pdf -o book.txt

  # Write <base>.txt into a directory
  scanlate book.pdf -o out/

  # Use specific models
  scanlate --ocr-model gpt-4.1-nano --translation-model gpt-4.1 book.pdf

  # Process from URL
  scanlate https://example.com/scans/kitab.pdf -o kitab.txt

  # Inspect PDF metadata (no API key needed)
  scanlate --inspect-only book.pdf

  # JSON output with per-page results
  scanlate --json book.pdf > result.json

  # Custom prompts from files
  scanlate --ocr-prompt ocr.txt --translation-prompt translate.txt book.pdf

FALLBACK TIERS:
  translated   every usable page was OCR'd and translated (best)
  raw          the PDF's embedded text layer (used when OCR/translation
               produced nothing, no provider was configured, or the page
               loop failed catastrophically)
  none         no tier produced any text

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY         OpenAI API key
  ANTHROPIC_API_KEY      Anthropic API key
  GEMINI_API_KEY         Google Gemini API key
  SCANLATE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  SCANLATE_MODEL         Override model ID for both stages
  PDFIUM_LIB_PATH        Path to an existing libpdfium

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Process:       scanlate book.pdf -o book.txt

  Without an API key scanlate still runs — it degrades to the PDF's
  embedded text layer, which for scanned books is usually empty.
"#;

/// OCR and translate scanned PDFs using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "scanlate",
    version,
    about = "OCR and translate scanned PDFs using Vision LLMs",
    long_about = "Process scanned PDF documents (local files or URLs) page by page: render, \
OCR with a vision LLM, translate with a second LLM call. Falls back to the PDF's embedded \
text layer when the OCR/translation path is unavailable, so a result is always produced \
when the document itself is readable.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write text to this file (or into this directory) instead of stdout.
    #[arg(short, long, env = "SCANLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Vision LLM model for the OCR stage.
    #[arg(
        long,
        long_help = "Vision LLM model for the OCR stage. Default: gpt-4.1-nano.\n\
          Must support image input."
    )]
    ocr_model: Option<String>,

    /// LLM model for the translation stage.
    #[arg(
        long,
        long_help = "LLM model for the translation stage. Default: gpt-4.1-mini.\n\
          Text-only; a stronger model here pays off more than on the OCR stage."
    )]
    translation_model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "SCANLATE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "SCANLATE_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SCANLATE_PASSWORD")]
    password: Option<String>,

    /// Path to a text file with a custom OCR prompt ({page} placeholder).
    #[arg(long, env = "SCANLATE_OCR_PROMPT")]
    ocr_prompt: Option<PathBuf>,

    /// Path to a text file with a custom translation prompt ({text} placeholder).
    #[arg(long, env = "SCANLATE_TRANSLATION_PROMPT")]
    translation_prompt: Option<PathBuf>,

    /// Per-page OCR call timeout in seconds.
    #[arg(long, env = "SCANLATE_OCR_TIMEOUT", default_value_t = 180)]
    ocr_timeout: u64,

    /// Per-page translation call timeout in seconds.
    #[arg(long, env = "SCANLATE_TRANSLATION_TIMEOUT", default_value_t = 240)]
    translation_timeout: u64,

    /// Max LLM output tokens per call.
    #[arg(long, env = "SCANLATE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SCANLATE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Output structured JSON (DocumentResult) instead of plain text.
    #[arg(long, env = "SCANLATE_JSON")]
    json: bool,

    /// Print PDF metadata only, no processing.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "SCANLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCANLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCANLATE_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SCANLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // While the progress bar is active library INFO logs are suppressed;
    // the bar carries all the feedback the user needs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let default_filter = match (cli.verbose, cli.quiet || show_progress) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            let fields = [
                ("File", Some(cli.input.clone())),
                ("Title", meta.title.clone()),
                ("Author", meta.author.clone()),
                ("Subject", meta.subject.clone()),
                ("Pages", Some(meta.page_count.to_string())),
                ("PDF version", Some(meta.pdf_version.clone())),
                ("Producer", meta.producer.clone()),
                ("Creator", meta.creator.clone()),
            ];
            for (label, value) in fields {
                if let Some(v) = value {
                    println!("{label:<13} {v}");
                }
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar is initialised with a spinner (no page count yet);
    // `on_document_start` resizes it to the correct total once the PDF
    // has been opened.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ProcessProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    if let Some(ref output_arg) = cli.output {
        // A directory target gets the deterministic <base>.txt name inside it.
        let output_path = if output_arg.is_dir() {
            output_arg.join(output_file_name(&cli.input))
        } else {
            output_arg.clone()
        };

        let result = process_to_file(&cli.input, &output_path, &config)
            .await
            .context("Processing failed")?;

        // Summary line (callback already printed the per-page log).
        if !cli.quiet {
            if let Some(ref reason) = result.aborted {
                eprintln!("{} {}", yellow("⚠"), reason);
            }
            if result.tier == Tier::None {
                eprintln!(
                    "{} no text could be extracted, nothing written",
                    red("✘")
                );
            } else {
                eprintln!(
                    "{}  {}/{} pages  {} tier  {}ms  →  {}",
                    if result.stats.failed_pages == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    result.stats.translated_pages,
                    result.stats.total_pages,
                    bold(&result.tier.to_string()),
                    result.stats.total_duration_ms,
                    bold(&output_path.display().to_string()),
                );
            }
        }
    } else {
        let result = process(&cli.input, &config)
            .await
            .context("Processing failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialise output")?
            );
        } else {
            let mut out = io::stdout().lock();
            out.write_all(result.text.as_bytes())
                .context("Failed to write to stdout")?;
            if !result.text.ends_with('\n') {
                out.write_all(b"\n").ok();
            }
        }

        // Summary (the callback already printed the final tick).
        if !cli.quiet && !show_progress && !cli.json {
            if let Some(ref reason) = result.aborted {
                eprintln!("Warning: {}", reason);
            }
            eprintln!(
                "Processed {}/{} pages in {}ms ({} tier)",
                result.stats.translated_pages,
                result.stats.total_pages,
                result.stats.total_duration_ms,
                result.tier,
            );
            if result.stats.failed_pages > 0 {
                eprintln!("  {} pages failed", result.stats.failed_pages);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ProcessConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessConfig> {
    let ocr_prompt = read_prompt_file(&cli.ocr_prompt).await?;
    let translation_prompt = read_prompt_file(&cli.translation_prompt).await?;

    let mut builder = ProcessConfig::builder()
        .dpi(cli.dpi)
        .ocr_timeout_secs(cli.ocr_timeout)
        .translation_timeout_secs(cli.translation_timeout)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Apply fields the builder doesn't have setters for (or that need special handling)
    config.ocr_model = cli.ocr_model.clone();
    config.translation_model = cli.translation_model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.ocr_prompt = ocr_prompt;
    config.translation_prompt = translation_prompt;

    Ok(config)
}

/// Read an optional prompt override from a file.
async fn read_prompt_file(path: &Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(p) => Ok(Some(
            tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", p))?,
        )),
        None => Ok(None),
    }
}

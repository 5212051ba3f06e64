//! Document processing: the per-page pipeline, the aggregator that drives
//! it, and the library entry points.
//!
//! ## Failure isolation
//!
//! Every page produces exactly one [`PageResult`], whatever happens to it.
//! A render, OCR, or translation failure is recorded in that result and the
//! loop moves on — nothing a single page does can abort the document. The
//! one exception is a failure of the loop infrastructure itself (a panicked
//! blocking task, an internal error escaping the renderer): that is
//! catastrophic, and the aggregator responds by discarding *all* accumulated
//! OCR/translation results — not just the failed page — and falling through
//! to the raw-extraction tier. All-or-nothing for the expensive tier,
//! page-by-page isolation within it.
//!
//! ## Sequencing
//!
//! Pages run strictly in ascending index order with no overlap: each page's
//! image is rendered, consumed by the OCR call, and dropped before the next
//! page is touched. The two network calls are the only suspension points,
//! each under a hard wall-clock bound and never retried.

use crate::config::ProcessConfig;
use crate::error::{ScanlateError, StageError};
use crate::fallback::{self, Tier};
use crate::output::{self, DocumentMetadata, DocumentResult, PageResult, ProcessStats, Stage};
use crate::pipeline::ocr::{LlmOcrEngine, OcrEngine};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::translate::{LlmTranslator, Translator};
use crate::pipeline::{encode, input};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default OCR model: cheap, fast, vision-capable.
pub const DEFAULT_OCR_MODEL: &str = "gpt-4.1-nano";

/// Default translation model: the rule-bound translation prompt benefits
/// from a stronger text model than the OCR stage needs.
pub const DEFAULT_TRANSLATION_MODEL: &str = "gpt-4.1-mini";

/// Process a PDF file or URL end to end.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Processing configuration
///
/// # Returns
/// `Ok(DocumentResult)` whenever the document could be opened, even if every
/// page failed — check `result.tier` to see which fallback tier was used,
/// and `result.aborted` for a catastrophic-loop warning.
///
/// # Errors
/// Returns `Err(ScanlateError)` only for fatal errors: file not found, not
/// a valid PDF, wrong password, document unopenable.
pub async fn process(
    input_str: impl AsRef<str>,
    config: &ProcessConfig,
) -> Result<DocumentResult, ScanlateError> {
    let input_str = input_str.as_ref();
    info!("Starting processing: {}", input_str);

    // Keep `resolved` alive for the whole pass: dropping it would delete a
    // downloaded temp file out from under the renderer.
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let renderer = PdfiumRenderer::new(resolved.path(), config);

    process_with_renderer(&renderer, config).await
}

/// Process PDF bytes in memory.
///
/// pdfium needs a file-system path, so the bytes are written to a managed
/// [`tempfile`] that is cleaned up automatically on return or panic. This is
/// the right API when the PDF arrives from an upload or a database rather
/// than a file on disk.
pub async fn process_from_bytes(
    bytes: &[u8],
    config: &ProcessConfig,
) -> Result<DocumentResult, ScanlateError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ScanlateError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ScanlateError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `process` returns
    process(&path, config).await
}

/// Synchronous wrapper around [`process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    input_str: impl AsRef<str>,
    config: &ProcessConfig,
) -> Result<DocumentResult, ScanlateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScanlateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(input_str, config))
}

/// Process a document and persist the selected text.
///
/// Uses atomic write (temp file + rename) to prevent partial files. When no
/// tier produced any text ([`Tier::None`]) nothing is written; callers can
/// tell from the returned result.
pub async fn process_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ProcessConfig,
) -> Result<DocumentResult, ScanlateError> {
    let result = process(input_str, config).await?;
    let path = output_path.as_ref();

    if result.tier == Tier::None {
        warn!("No text could be extracted; not writing {}", path.display());
        return Ok(result);
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ScanlateError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
        _ => {}
    }

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, &result.text)
        .await
        .map_err(|e| ScanlateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ScanlateError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} ({} tier)", path.display(), result.tier);
    Ok(result)
}

/// Extract document metadata without invoking any model.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, ScanlateError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let renderer = PdfiumRenderer::new(resolved.path(), &ProcessConfig::default());
    renderer.metadata().await
}

/// Deterministic output file name for an input: its base name with the
/// extension replaced by `.txt`.
///
/// Works for both paths and URLs: `uploads/kitab.pdf` → `kitab.txt`,
/// `https://example.com/scans/v2.1/book.pdf` → `book.txt`.
pub fn output_file_name(input: &str) -> String {
    let last = input
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input);
    let stem = match last.rsplit_once('.') {
        Some((s, _)) if !s.is_empty() => s,
        _ => last,
    };
    format!("{stem}.txt")
}

/// Drive the full pipeline over an already-constructed document source.
///
/// This is the core of the library; [`process`] is a thin wrapper that
/// resolves the input to a path and constructs a [`PdfiumRenderer`]. Exposed
/// so callers with their own [`PageRenderer`] implementation (a different
/// PDF backend, an image directory, a test double) can reuse the whole
/// aggregation and fallback machinery.
pub async fn process_with_renderer(
    renderer: &dyn PageRenderer,
    config: &ProcessConfig,
) -> Result<DocumentResult, ScanlateError> {
    let total_start = Instant::now();

    // ── Step 1: Open the document ────────────────────────────────────────
    // The only fatal path past this point is output I/O: an unopenable
    // document leaves no tier available at all.
    let metadata = renderer.metadata().await?;
    let total_pages = metadata.page_count;
    info!("Document has {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(total_pages);
    }

    // ── Step 2: Raw text-layer extraction (fallback tier) ────────────────
    // Independent of the per-page pipeline; succeeds or fails as one unit,
    // and its failure is isolated here.
    let raw_start = Instant::now();
    let raw_text = match renderer.extract_text().await {
        Ok(text) => {
            if text.trim().is_empty() {
                info!("Raw extraction found no text layer");
            } else {
                info!("Raw extraction: {} chars", text.len());
            }
            text
        }
        Err(e) => {
            warn!("Raw extraction failed (continuing without it): {}", e);
            String::new()
        }
    };
    let raw_extract_duration_ms = raw_start.elapsed().as_millis() as u64;

    // ── Step 3: Resolve the OCR/translation stages ───────────────────────
    // Failure to resolve a provider is not fatal: the expensive tier is
    // skipped with a warning and selection falls through to the raw tier.
    let stages = resolve_stages(config);

    // ── Step 4: Sequential page loop ─────────────────────────────────────
    let pipeline_start = Instant::now();
    let (pages, aborted) = match stages {
        None => (Vec::new(), None),
        Some((ocr, translator)) => {
            match run_page_loop(renderer, ocr.as_ref(), translator.as_ref(), total_pages, config)
                .await
            {
                Ok(pages) => (pages, None),
                Err(e) => {
                    // Catastrophic loop failure: discard everything the
                    // OCR/translation tier accumulated, not just the failed
                    // page, and fall through to the raw tier.
                    warn!(
                        "Page loop aborted, discarding all OCR/translation results: {}",
                        e
                    );
                    (Vec::new(), Some(e.to_string()))
                }
            }
        }
    };
    let pipeline_duration_ms = pipeline_start.elapsed().as_millis() as u64;

    // ── Step 5: Candidates and fallback selection ────────────────────────
    let translated_candidate = output::translated_candidate(&pages);
    let (text, tier) = fallback::select(&translated_candidate, &raw_text);
    info!("Selected tier: {}", tier);

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let ocr_pages = pages.iter().filter(|p| !p.ocr_text.is_empty()).count();
    let translated_pages = pages
        .iter()
        .filter(|p| !p.translated_text.is_empty())
        .count();
    let failed_pages = pages.iter().filter(|p| p.failure.is_some()).count();

    let stats = ProcessStats {
        total_pages,
        ocr_pages,
        translated_pages,
        failed_pages,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        raw_extract_duration_ms,
        pipeline_duration_ms,
    };

    info!(
        "Processing complete: {}/{} pages translated, tier={}, {}ms total",
        translated_pages, total_pages, tier, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(total_pages, translated_pages, tier);
    }

    Ok(DocumentResult {
        text,
        tier,
        raw_text,
        pages,
        metadata,
        stats,
        aborted,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the per-page pipeline over every page, in strictly ascending order.
///
/// `Err` here means the loop infrastructure itself failed — the caller
/// treats it as catastrophic. Per-page failures never surface as `Err`.
async fn run_page_loop(
    renderer: &dyn PageRenderer,
    ocr: &dyn OcrEngine,
    translator: &dyn Translator,
    total_pages: usize,
    config: &ProcessConfig,
) -> Result<Vec<PageResult>, ScanlateError> {
    let mut pages = Vec::with_capacity(total_pages);

    for index in 0..total_pages {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let result = process_page(renderer, ocr, translator, index, total_pages, config).await?;

        if let Some(ref cb) = config.progress_callback {
            match &result.failure {
                Some(f) => cb.on_page_error(page_num, total_pages, &f.to_string()),
                None => cb.on_page_complete(page_num, total_pages, &result),
            }
        }

        pages.push(result);
    }

    Ok(pages)
}

/// Process one page end to end: render → encode → OCR → translate.
///
/// Always returns `Ok(PageResult)` for failures scoped to this page; `Err`
/// is reserved for loop-infrastructure failures (a panicked render task or
/// any unexpected renderer error), which the caller treats as catastrophic.
async fn process_page(
    renderer: &dyn PageRenderer,
    ocr: &dyn OcrEngine,
    translator: &dyn Translator,
    index: usize,
    total_pages: usize,
    config: &ProcessConfig,
) -> Result<PageResult, ScanlateError> {
    let start = Instant::now();
    let page_num = index + 1;
    let notify_stage = |stage: Stage| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_start(page_num, total_pages, stage);
        }
    };

    // ── Stage 1: Render ──────────────────────────────────────────────────
    notify_stage(Stage::Render);
    let image = match renderer.render_page(index).await {
        Ok(img) => img,
        Err(ScanlateError::RenderFailed { page, detail }) => {
            warn!("Page {}: render failed: {}", page_num, detail);
            return Ok(PageResult::empty(
                index,
                Some(StageError::Render { page, detail }),
                start.elapsed().as_millis() as u64,
            ));
        }
        // Anything else escaping the renderer is a loop-infrastructure
        // failure, not a page failure.
        Err(e) => return Err(e),
    };

    let encoded = match encode::encode_page(&image) {
        Ok(data) => data,
        Err(e) => {
            warn!("Page {}: image encoding failed: {}", page_num, e);
            return Ok(PageResult::empty(
                index,
                Some(StageError::Render {
                    page: page_num,
                    detail: format!("image encoding failed: {}", e),
                }),
                start.elapsed().as_millis() as u64,
            ));
        }
    };
    // The raster exists only to feed the OCR call; let it go before the
    // (potentially minutes-long) network suspension.
    drop(image);

    // ── Stage 2: OCR ─────────────────────────────────────────────────────
    notify_stage(Stage::Ocr);
    let ocr_text = match ocr.recognize(encoded, page_num).await {
        Ok(text) => text,
        Err(e) => {
            let failure = e.into_stage_error(Stage::Ocr, page_num);
            warn!("{}", failure);
            return Ok(PageResult::empty(
                index,
                Some(failure),
                start.elapsed().as_millis() as u64,
            ));
        }
    };

    if ocr_text.trim().is_empty() {
        // A successful call that produced nothing: not a failure, but this
        // page contributes to no tier and translation is skipped.
        warn!("Page {}: OCR returned no text, skipping translation", page_num);
        return Ok(PageResult::empty(
            index,
            None,
            start.elapsed().as_millis() as u64,
        ));
    }
    debug!("Page {}: OCR produced {} chars", page_num, ocr_text.len());

    // ── Stage 3: Translate (only on non-empty OCR output) ────────────────
    notify_stage(Stage::Translate);
    match translator.translate(&ocr_text).await {
        Ok(translated) if translated.trim().is_empty() => {
            warn!("Page {}: translation returned no text", page_num);
            Ok(PageResult::ocr_only(
                index,
                ocr_text,
                None,
                start.elapsed().as_millis() as u64,
            ))
        }
        Ok(translated) => {
            debug!(
                "Page {}: translation produced {} chars",
                page_num,
                translated.len()
            );
            Ok(PageResult::translated(
                index,
                ocr_text,
                translated,
                start.elapsed().as_millis() as u64,
            ))
        }
        Err(e) => {
            let failure = e.into_stage_error(Stage::Translate, page_num);
            warn!("{}", failure);
            Ok(PageResult::ocr_only(
                index,
                ocr_text,
                Some(failure),
                start.elapsed().as_millis() as u64,
            ))
        }
    }
}

/// Resolve the OCR and translation stages from the config.
///
/// Injected stage implementations take priority; otherwise each stage wraps
/// an LLM provider resolved through the chain in [`resolve_provider`].
/// Returns `None` — skip the whole OCR/translation tier — when a needed
/// provider cannot be resolved: a missing API key degrades the document to
/// the raw tier instead of failing it.
fn resolve_stages(
    config: &ProcessConfig,
) -> Option<(Arc<dyn OcrEngine>, Arc<dyn Translator>)> {
    let ocr: Arc<dyn OcrEngine> = match &config.ocr {
        Some(engine) => Arc::clone(engine),
        None => {
            let model = config.ocr_model.as_deref().unwrap_or(DEFAULT_OCR_MODEL);
            match resolve_provider(config, model) {
                Ok(provider) => Arc::new(LlmOcrEngine::new(provider, config)),
                Err(e) => {
                    warn!("OCR/translation tier skipped: {}", e);
                    return None;
                }
            }
        }
    };

    let translator: Arc<dyn Translator> = match &config.translator {
        Some(translator) => Arc::clone(translator),
        None => {
            let model = config
                .translation_model
                .as_deref()
                .unwrap_or(DEFAULT_TRANSLATION_MODEL);
            match resolve_provider(config, model) {
                Ok(provider) => Arc::new(LlmTranslator::new(provider, config)),
                Err(e) => {
                    warn!("OCR/translation tier skipped: {}", e);
                    return None;
                }
            }
        }
    };

    Some((ocr, translator))
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ScanlateError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScanlateError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve an LLM provider for one stage, from most-specific to
/// least-specific:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; used as-is for both stages.
///
/// 2. **Named provider** (`config.provider_name`) — the caller named a
///    provider (e.g. `"openai"`); the factory reads the corresponding API
///    key from the environment.
///
/// 3. **Environment pair** (`SCANLATE_LLM_PROVIDER` + `SCANLATE_MODEL`) —
///    a provider and model chosen at the execution-environment level. The
///    env model applies to both stages, overriding the per-stage default.
///
/// 4. **OpenAI preference** — an `OPENAI_API_KEY` in the environment wins
///    over full auto-detection, so users with several keys get a
///    predictable default.
///
/// 5. **Full auto-detection** (`ProviderFactory::from_env`) — scan all
///    known API key variables and pick the first available provider.
fn resolve_provider(
    config: &ProcessConfig,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ScanlateError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + stage model
    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("SCANLATE_LLM_PROVIDER"),
        std::env::var("SCANLATE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    // 4) Prefer OpenAI when its key is present
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    // 5) Full auto-detection
    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScanlateError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(provider)
}

//! Error types for the scanlate library.
//!
//! Three distinct error types reflect three distinct failure scopes:
//!
//! * [`ScanlateError`] — **Fatal**: the document cannot be processed at all
//!   (bad input file, corrupt PDF, wrong password). Returned as
//!   `Err(ScanlateError)` from the top-level `process*` functions. Once a
//!   document has been opened, only output I/O can still fail fatally.
//!
//! * [`StageError`] — **Non-fatal, page-scoped**: one stage of one page's
//!   pipeline failed (render glitch, OCR timeout, translation API error).
//!   Stored inside [`crate::output::PageResult`] so callers can inspect
//!   partial success rather than losing the whole document to one bad page.
//!
//! * [`ServiceError`] — the error shape at the OCR/translation service
//!   boundary. Stage implementations ([`crate::pipeline::ocr::OcrEngine`],
//!   [`crate::pipeline::translate::Translator`]) return this; the page
//!   pipeline tags it with the page number and stage to form a `StageError`.
//!
//! The separation enforces the propagation policy: page-level errors are
//! recovered locally and recorded, never raised past the aggregator.

use crate::output::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scanlate library.
///
/// Page-level failures use [`StageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ScanlateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("no PDF found at '{path}': check the path exists and is readable")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("cannot read '{path}': permission denied")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("'{input}' is neither an existing file path nor an HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("download of '{url}' failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("download of '{url}' timed out after {secs}s (see --download-timeout)")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("'{path}' is not a PDF (leading bytes {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document could not be opened: header/trailer/xref is corrupt.
    ///
    /// Fatal for the whole document — both the OCR/translation tier and the
    /// raw-extraction tier need an open document.
    #[error("cannot open PDF '{path}': {detail}")]
    OpenFailed { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted: supply the password with --password")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("incorrect password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The renderer failed to rasterise a specific page.
    ///
    /// The page pipeline converts this into [`StageError::Render`]; it never
    /// reaches callers of the `process*` functions.
    #[error("page {page} could not be rasterised: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured LLM provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' could not be initialised: {hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("could not write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a panicked blocking task).
    ///
    /// When this escapes the per-page loop it is treated as a catastrophic
    /// loop failure: all accumulated OCR/translation results are discarded
    /// and the document falls back to the raw-extraction tier.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error scoped to a single page's pipeline stage.
///
/// Stored in [`crate::output::PageResult::failure`]. Processing always
/// continues with the next page; a `StageError` only limits which tier the
/// affected page can contribute to.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// Page rasterisation (or image encoding) failed. OCR and translation
    /// were not attempted for this page.
    #[error("Page {page}: render failed: {detail}")]
    Render { page: usize, detail: String },

    /// The OCR service returned an error. Translation was skipped.
    #[error("Page {page}: OCR failed: {detail}")]
    Ocr { page: usize, detail: String },

    /// The OCR call exceeded its wall-clock bound. Translation was skipped.
    #[error("Page {page}: OCR timed out after {secs}s")]
    OcrTimeout { page: usize, secs: u64 },

    /// The translation service returned an error. The page's OCR text is
    /// still recorded.
    #[error("Page {page}: translation failed: {detail}")]
    Translation { page: usize, detail: String },

    /// The translation call exceeded its wall-clock bound.
    #[error("Page {page}: translation timed out after {secs}s")]
    TranslationTimeout { page: usize, secs: u64 },
}

impl StageError {
    /// Which pipeline stage produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Render { .. } => Stage::Render,
            StageError::Ocr { .. } | StageError::OcrTimeout { .. } => Stage::Ocr,
            StageError::Translation { .. } | StageError::TranslationTimeout { .. } => {
                Stage::Translate
            }
        }
    }

    /// 1-based page number this error is scoped to.
    pub fn page(&self) -> usize {
        match self {
            StageError::Render { page, .. }
            | StageError::Ocr { page, .. }
            | StageError::OcrTimeout { page, .. }
            | StageError::Translation { page, .. }
            | StageError::TranslationTimeout { page, .. } => *page,
        }
    }
}

/// Error shape at the OCR/translation service boundary.
///
/// Deliberately provider-agnostic: the page pipeline only needs to know
/// whether the call timed out or failed, and what to log. Implementations
/// of the stage traits map their provider's error type into this.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The call exceeded its hard wall-clock bound. Not retried.
    #[error("service call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The service returned an error (HTTP failure, API error, bad response).
    #[error("service call failed: {detail}")]
    Api { detail: String },
}

impl ServiceError {
    /// Tag this service error with the page and stage it occurred on.
    pub(crate) fn into_stage_error(self, stage: Stage, page: usize) -> StageError {
        match (stage, self) {
            (Stage::Ocr, ServiceError::Timeout { secs }) => StageError::OcrTimeout { page, secs },
            (Stage::Ocr, ServiceError::Api { detail }) => StageError::Ocr { page, detail },
            (Stage::Translate, ServiceError::Timeout { secs }) => {
                StageError::TranslationTimeout { page, secs }
            }
            (Stage::Translate, ServiceError::Api { detail }) => {
                StageError::Translation { page, detail }
            }
            // Render never crosses the service boundary.
            (Stage::Render, ServiceError::Timeout { secs }) => StageError::Render {
                page,
                detail: format!("timed out after {secs}s"),
            },
            (Stage::Render, ServiceError::Api { detail }) => StageError::Render { page, detail },
        }
    }
}

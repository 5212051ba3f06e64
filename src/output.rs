//! Output types: per-page outcomes, the aggregated document result, and
//! processing statistics.
//!
//! A [`PageResult`] never represents an aborted page: every page index of the
//! document produces exactly one entry, even when every stage failed. What a
//! failure changes is which *tier* the page can still contribute to — a page
//! whose translation failed still contributes OCR text, a page whose render
//! failed contributes nothing. The aggregated [`DocumentResult`] carries the
//! final selected text together with the [`Tier`] it came from so callers
//! are never left guessing where their text originated.

use crate::error::StageError;
use crate::fallback::Tier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the per-page pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Rasterise the page to a PNG image.
    Render,
    /// Send the page image to the OCR model.
    Ocr,
    /// Send the OCR text to the translation model.
    Translate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Render => write!(f, "render"),
            Stage::Ocr => write!(f, "ocr"),
            Stage::Translate => write!(f, "translate"),
        }
    }
}

/// The outcome of pipelining one page.
///
/// Invariant: `translated_text` is non-empty only if `ocr_text` is non-empty
/// (translation is only attempted on non-empty OCR output). The constructors
/// below are the only places the pipeline builds these, which keeps the
/// invariant in one screen of code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Zero-based page index within the document.
    pub index: usize,
    /// OCR output, verbatim as the service returned it (markers included).
    /// Empty = OCR failed or produced nothing.
    pub ocr_text: String,
    /// Translated text. Empty = translation skipped, failed, or produced
    /// nothing.
    pub translated_text: String,
    /// The stage failure that limited this page's contribution, if any.
    /// An empty-but-successful OCR response is not a failure.
    pub failure: Option<StageError>,
    /// Wall-clock time spent on this page, all stages included.
    pub duration_ms: u64,
}

impl PageResult {
    /// 1-based page number, as used in prompts and log lines.
    pub fn page_number(&self) -> usize {
        self.index + 1
    }

    /// Page with no usable output at all (render or OCR failed / OCR empty).
    pub(crate) fn empty(index: usize, failure: Option<StageError>, duration_ms: u64) -> Self {
        Self {
            index,
            ocr_text: String::new(),
            translated_text: String::new(),
            failure,
            duration_ms,
        }
    }

    /// Page with OCR text but no translation (translation failed or empty).
    pub(crate) fn ocr_only(
        index: usize,
        ocr_text: String,
        failure: Option<StageError>,
        duration_ms: u64,
    ) -> Self {
        Self {
            index,
            ocr_text,
            translated_text: String::new(),
            failure,
            duration_ms,
        }
    }

    /// Fully processed page. `ocr_text` must be non-empty.
    pub(crate) fn translated(
        index: usize,
        ocr_text: String,
        translated_text: String,
        duration_ms: u64,
    ) -> Self {
        debug_assert!(!ocr_text.is_empty());
        Self {
            index,
            ocr_text,
            translated_text,
            failure: None,
            duration_ms,
        }
    }
}

/// Document metadata extracted without invoking any model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Statistics for one document-processing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages whose OCR produced non-empty text.
    pub ocr_pages: usize,
    /// Pages whose translation produced non-empty text.
    pub translated_pages: usize,
    /// Pages carrying a stage failure.
    pub failed_pages: usize,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
    /// Time spent in the whole-document raw text extraction pass.
    pub raw_extract_duration_ms: u64,
    /// Time spent in the per-page render/OCR/translate loop.
    pub pipeline_duration_ms: u64,
}

/// The aggregated result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// The selected output text — the best non-blank candidate. Empty when
    /// `tier` is [`Tier::None`].
    pub text: String,
    /// Which tier `text` came from.
    pub tier: Tier,
    /// The whole-document raw extraction candidate (may be empty).
    pub raw_text: String,
    /// Per-page outcomes in ascending index order. Empty when the page loop
    /// was aborted catastrophically or the OCR tier was skipped.
    pub pages: Vec<PageResult>,
    /// Document metadata from the open pass.
    pub metadata: DocumentMetadata,
    /// Timing and coverage statistics.
    pub stats: ProcessStats,
    /// Set when the per-page loop failed catastrophically: all OCR and
    /// translation results were discarded and the raw tier was used.
    /// A warning, not a fatal error.
    pub aborted: Option<String>,
}

impl DocumentResult {
    /// The translated candidate: non-empty per-page translations joined by a
    /// paragraph break. Recomputed from `pages`, so an aborted pass yields
    /// an empty candidate.
    pub fn translated_candidate(&self) -> String {
        translated_candidate(&self.pages)
    }

    /// True when no tier produced any usable text.
    pub fn is_empty(&self) -> bool {
        self.tier == Tier::None
    }
}

/// Join the non-empty per-page translations with a paragraph break.
///
/// Pages that contributed no translation are silently skipped; partial
/// coverage still produces a usable candidate.
pub(crate) fn translated_candidate(pages: &[PageResult]) -> String {
    pages
        .iter()
        .filter(|p| !p.translated_text.is_empty())
        .map(|p| p.translated_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

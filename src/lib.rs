//! # scanlate
//!
//! Scanned-PDF OCR and translation with graceful degradation.
//!
//! scanlate takes a scanned PDF (local path or URL), renders each page to a
//! high-resolution raster, reads the page with a vision-capable LLM, and
//! translates the recognized text with a second LLM call. When the expensive
//! path fails — no API key, a dead network, a catastrophic loop failure —
//! the document falls back to its embedded text layer instead of erroring
//! out, so a result of *some* quality is always produced when the PDF itself
//! is readable.
//!
//! ## Why another PDF tool?
//!
//! Scanned books have no usable text layer: classic extraction yields noise
//! or nothing, and traditional OCR engines struggle with the dense
//! multi-script typography (Urdu body text with inline Arabic citations)
//! this crate is built for. Vision LLMs handle both scripts in one pass and
//! can translate in the same pipeline.
//!
//! ## Pipeline
//!
//! ```text
//! PDF (path/URL) → pdfium render @300 DPI → PNG/base64 → vision LLM (OCR)
//!                                                          │
//!                        translation LLM  ◀── non-empty ───┘
//!                              │
//!                              ▼
//!           tier selection: translated > raw extraction > none
//! ```
//!
//! Pages run strictly one at a time, in order; a failed page yields an
//! empty slot and a recorded [`StageError`] rather than aborting the run.
//!
//! ## Quick start
//!
//! ```no_run
//! use scanlate::{process, ProcessConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY (etc.) from the environment.
//!     let config = ProcessConfig::default();
//!     let result = process("scan.pdf", &config).await?;
//!     println!("tier: {}", result.tier);
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! With explicit models and a progress callback:
//!
//! ```no_run
//! use scanlate::ProcessConfig;
//!
//! let config = ProcessConfig::builder()
//!     .ocr_model("gpt-4.1-nano")
//!     .translation_model("gpt-4.1-mini")
//!     .dpi(300)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Feature flags
//!
//! - `cli` *(default)* — builds the `scanlate` binary (clap, indicatif,
//!   anyhow, tracing-subscriber). Disable for library-only use:
//!   `scanlate = { version = "...", default-features = false }`.

pub mod config;
pub mod error;
pub mod fallback;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;

pub use config::{ProcessConfig, ProcessConfigBuilder};
pub use error::{ScanlateError, ServiceError, StageError};
pub use fallback::{select, Tier};
pub use output::{DocumentMetadata, DocumentResult, PageResult, ProcessStats, Stage};
pub use pipeline::ocr::OcrEngine;
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use pipeline::translate::Translator;
pub use process::{
    inspect, output_file_name, process, process_from_bytes, process_sync, process_to_file,
    process_with_renderer, DEFAULT_OCR_MODEL, DEFAULT_TRANSLATION_MODEL,
};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
pub use prompts::{DEFAULT_OCR_PROMPT, DEFAULT_TRANSLATION_PROMPT};

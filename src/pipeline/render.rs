//! Document source: page counting, per-page rasterisation, and the raw
//! text-layer extraction pass, behind the [`PageRenderer`] seam.
//!
//! ## Why a trait?
//!
//! The aggregator only needs "open, count pages, render page N, extract the
//! text layer". Putting that behind `PageRenderer` keeps the pipeline
//! testable with synthetic documents and keeps pdfium an external
//! collaborator rather than a hard-wired dependency of the core loop.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations.
//!
//! ## Handle lifetime
//!
//! pdfium document handles are not `Send`, so [`PdfiumRenderer`] never holds
//! one across an await point: every operation opens the document inside its
//! blocking closure and the handle is dropped when the closure returns —
//! on success, on failure, and on panic alike. Pages are rendered strictly
//! in sequence by the caller, so no two opens ever overlap within a pass.

use crate::config::ProcessConfig;
use crate::error::ScanlateError;
use crate::output::DocumentMetadata;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The document source boundary: everything the aggregator needs from a
/// document, and nothing else.
///
/// Error contract: [`ScanlateError::RenderFailed`] from [`render_page`] is a
/// page-local failure the pipeline converts into a
/// [`crate::error::StageError::Render`]; any other error escaping
/// `render_page` is treated as catastrophic by the page loop. `metadata`
/// and `page_count` failures are fatal for the document.
///
/// [`render_page`]: PageRenderer::render_page
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Open the document and report its metadata (including page count).
    async fn metadata(&self) -> Result<DocumentMetadata, ScanlateError>;

    /// Number of pages in the document.
    async fn page_count(&self) -> Result<usize, ScanlateError>;

    /// Rasterise the page at the given zero-based index.
    async fn render_page(&self, index: usize) -> Result<DynamicImage, ScanlateError>;

    /// Whole-document raw text-layer extraction: the concatenation of every
    /// page's embedded text, in page order. Succeeds or fails as a single
    /// unit; independent of the per-page OCR pipeline.
    async fn extract_text(&self) -> Result<String, ScanlateError>;
}

/// Production [`PageRenderer`] backed by pdfium.
pub struct PdfiumRenderer {
    path: PathBuf,
    password: Option<String>,
    dpi: u32,
    max_pixels: u32,
}

impl PdfiumRenderer {
    /// Create a renderer for the PDF at `path` using the config's rendering
    /// parameters. The document is not opened until the first operation.
    pub fn new(path: impl Into<PathBuf>, config: &ProcessConfig) -> Self {
        Self {
            path: path.into(),
            password: config.password.clone(),
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
        }
    }
}

#[async_trait]
impl PageRenderer for PdfiumRenderer {
    async fn metadata(&self) -> Result<DocumentMetadata, ScanlateError> {
        let path = self.path.clone();
        let pwd = self.password.clone();
        tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
            .await
            .map_err(|e| ScanlateError::Internal(format!("Metadata task panicked: {}", e)))?
    }

    async fn page_count(&self) -> Result<usize, ScanlateError> {
        Ok(self.metadata().await?.page_count)
    }

    async fn render_page(&self, index: usize) -> Result<DynamicImage, ScanlateError> {
        let path = self.path.clone();
        let pwd = self.password.clone();
        let dpi = self.dpi;
        let max_pixels = self.max_pixels;
        tokio::task::spawn_blocking(move || {
            render_page_blocking(&path, pwd.as_deref(), index, dpi, max_pixels)
        })
        .await
        .map_err(|e| ScanlateError::Internal(format!("Render task panicked: {}", e)))?
    }

    async fn extract_text(&self) -> Result<String, ScanlateError> {
        let path = self.path.clone();
        let pwd = self.password.clone();
        tokio::task::spawn_blocking(move || extract_text_blocking(&path, pwd.as_deref()))
            .await
            .map_err(|e| ScanlateError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// Open a document, classifying the failure mode for the caller.
fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ScanlateError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ScanlateError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                ScanlateError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            ScanlateError::OpenFailed {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Blocking implementation of single-page rendering.
///
/// The render target width is derived from the page's physical width at the
/// configured DPI (PDF points are 1/72"), capped at `max_pixels` on either
/// axis so an outsized page cannot exhaust memory.
fn render_page_blocking(
    path: &Path,
    password: Option<&str>,
    index: usize,
    dpi: u32,
    max_pixels: u32,
) -> Result<DynamicImage, ScanlateError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path, password).map_err(|e| {
        // The document opened at the start of the pass; a failure now is
        // scoped to this page's render attempt.
        ScanlateError::RenderFailed {
            page: index + 1,
            detail: e.to_string(),
        }
    })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if index >= total {
        return Err(ScanlateError::RenderFailed {
            page: index + 1,
            detail: format!("page index out of range (document has {} pages)", total),
        });
    }

    let page = pages
        .get(index as u16)
        .map_err(|e| ScanlateError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let width_px = (page.width().value / 72.0 * dpi as f32).round() as u32;
    let target_width = width_px.clamp(1, max_pixels);

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ScanlateError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    Ok(image)
}

/// Blocking implementation of the raw text-layer pass.
fn extract_text_blocking(path: &Path, password: Option<&str>) -> Result<String, ScanlateError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path, password)?;

    let mut text = String::new();
    for page in document.pages().iter() {
        let page_text = page.text().map_err(|e| ScanlateError::OpenFailed {
            path: path.to_path_buf(),
            detail: format!("text layer unavailable: {:?}", e),
        })?;
        text.push_str(&page_text.all());
    }

    info!("Raw extraction: {} chars from text layer", text.len());
    Ok(text)
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ScanlateError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, path, password)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

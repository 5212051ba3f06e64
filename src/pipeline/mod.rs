//! Pipeline stages for scanned-document processing.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (a different rendering backend, a different model
//! provider) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ ocr ──▶ translate
//! (URL/path) (pdfium)  (base64)  (vision   (text
//!                                 model)    model)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local
//!    file
//! 2. [`render`]    — rasterise one page at a time; runs in `spawn_blocking`
//!    because pdfium is not async-safe. Also hosts the whole-document raw
//!    text-layer extraction used by the fallback tier.
//! 3. [`encode`]    — PNG-encode and base64-wrap each `DynamicImage` for the
//!    multimodal API request body
//! 4. [`ocr`]       — recognise one page image; a bounded network call
//! 5. [`translate`] — translate one page's OCR output; a bounded network call
//!
//! The per-page composition of these stages, with its failure isolation,
//! lives in [`crate::process`].

pub mod encode;
pub mod input;
pub mod ocr;
pub mod render;
pub mod translate;

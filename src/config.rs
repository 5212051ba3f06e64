//! Configuration types for document processing.
//!
//! All processing behaviour is controlled through [`ProcessConfig`], built
//! via its [`ProcessConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls and to diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::ScanlateError;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::translate::Translator;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for one document-processing pass.
///
/// Built via [`ProcessConfig::builder()`] or using
/// [`ProcessConfig::default()`].
///
/// # Example
/// ```rust
/// use scanlate::ProcessConfig;
///
/// let config = ProcessConfig::builder()
///     .dpi(300)
///     .ocr_model("gpt-4.1-nano")
///     .translation_model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// Rendering DPI used when rasterising each page. Range: 72–600. Default: 300.
    ///
    /// 300 DPI is the OCR sweet spot for scanned books: dense scripts stay
    /// legible to the vision model while the PNG payload remains well below
    /// typical API upload limits. Lower it for very large page formats where
    /// payload size matters more than pixel density.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI. A 300-DPI render of an A0 poster
    /// would produce a 27 000 px wide image and exhaust memory; this field
    /// caps either dimension, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// OCR model identifier (must be vision-capable), e.g. "gpt-4.1-nano",
    /// "gemini-2.0-flash". If None, uses the built-in default.
    pub ocr_model: Option<String>,

    /// Translation model identifier, e.g. "gpt-4.1-mini". If None, uses the
    /// built-in default. A stronger text model than the OCR model usually
    /// pays for itself here.
    pub translation_model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    /// If None along with `provider`, providers are auto-detected from the
    /// environment. Auto-detection *failure* is not fatal: the
    /// OCR/translation tier is skipped with a warning and the document falls
    /// back to raw extraction.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider, used for both stages. Takes precedence
    /// over `provider_name`. Useful in tests or when the caller needs custom
    /// middleware (caching, rate-limiting).
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed OCR engine. Takes precedence over any provider
    /// resolution — the model/provider fields are ignored for this stage.
    pub ocr: Option<Arc<dyn OcrEngine>>,

    /// Pre-constructed translator. Same precedence as `ocr`.
    pub translator: Option<Arc<dyn Translator>>,

    /// Hard wall-clock bound for one OCR call, in seconds. Default: 180.
    ///
    /// A timeout is converted into a page-local failure, never a document
    /// failure, and the call is not retried.
    pub ocr_timeout_secs: u64,

    /// Hard wall-clock bound for one translation call, in seconds. Default: 240.
    ///
    /// Translation output for a dense page is longer than its OCR input, so
    /// the bound is looser than the OCR one.
    pub translation_timeout_secs: u64,

    /// Sampling temperature for both model calls. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is on the page —
    /// exactly what you want for transcription and for rule-bound
    /// translation.
    pub temperature: f32,

    /// Maximum tokens either model may generate per page. Default: 8192.
    ///
    /// Dense scanned pages produce long OCR transcripts, and translations
    /// run longer still. Setting this too low silently truncates a page
    /// mid-sentence.
    pub max_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom OCR instruction template (`{page}` placeholder). If None, uses
    /// [`crate::prompts::DEFAULT_OCR_PROMPT`].
    pub ocr_prompt: Option<String>,

    /// Custom translation instruction template (`{text}` placeholder). If
    /// None, uses [`crate::prompts::DEFAULT_TRANSLATION_PROMPT`].
    pub translation_prompt: Option<String>,

    /// Progress event sink. If None, no events are emitted.
    pub progress_callback: Option<ProgressCallback>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 4000,
            ocr_model: None,
            translation_model: None,
            provider_name: None,
            provider: None,
            ocr: None,
            translator: None,
            ocr_timeout_secs: 180,
            translation_timeout_secs: 240,
            temperature: 0.1,
            max_tokens: 8192,
            password: None,
            ocr_prompt: None,
            translation_prompt: None,
            progress_callback: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("ocr_model", &self.ocr_model)
            .field("translation_model", &self.translation_model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("translator", &self.translator.as_ref().map(|_| "<dyn Translator>"))
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("translation_timeout_secs", &self.translation_timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = Some(model.into());
        self
    }

    pub fn translation_model(mut self, model: impl Into<String>) -> Self {
        self.config.translation_model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr = Some(engine);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn translation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.translation_timeout_secs = secs;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn ocr_prompt(mut self, template: impl Into<String>) -> Self {
        self.config.ocr_prompt = Some(template.into());
        self
    }

    pub fn translation_prompt(mut self, template: impl Into<String>) -> Self {
        self.config.translation_prompt = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, ScanlateError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ScanlateError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_timeout_secs == 0 || c.translation_timeout_secs == 0 {
            return Err(ScanlateError::InvalidConfig(
                "Stage timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ScanlateError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ProcessConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.ocr_timeout_secs, 180);
        assert_eq!(c.translation_timeout_secs, 240);
        assert_eq!(c.max_tokens, 8192);
        assert!(c.ocr.is_none());
        assert!(c.translator.is_none());
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ProcessConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(c.dpi, 600);
        let c = ProcessConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ProcessConfig::builder()
            .ocr_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn debug_elides_dyn_fields() {
        let s = format!("{:?}", ProcessConfig::default());
        assert!(s.contains("ocr_model"));
        assert!(!s.contains("Arc"));
    }
}

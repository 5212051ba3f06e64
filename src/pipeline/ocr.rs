//! OCR stage: recognise the text on one rendered page image.
//!
//! The stage is deliberately thin. It builds the page-numbered instruction
//! prompt, makes exactly one bounded model call, and returns whatever text
//! the service produced — verbatim, framing markers included. It never
//! parses the response and never retries: a timeout or API error is
//! reported as a [`ServiceError`] for the page pipeline to record, and an
//! empty response is a successful call that produced no text.

use crate::config::ProcessConfig;
use crate::error::ServiceError;
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The OCR service boundary: one page image in, free-form text out.
///
/// Implementations must be `Send + Sync`; the production implementation is
/// [`LlmOcrEngine`], and tests inject deterministic fakes through
/// [`crate::config::ProcessConfig::ocr`].
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text on `image`. `page_number` is 1-based and is used
    /// to parameterise the instruction prompt.
    ///
    /// `Ok(String::new())` means the service answered but produced no text;
    /// it is not an error.
    async fn recognize(&self, image: ImageData, page_number: usize)
        -> Result<String, ServiceError>;
}

/// OCR engine backed by a vision-capable chat model.
pub struct LlmOcrEngine {
    provider: Arc<dyn LLMProvider>,
    prompt_template: Option<String>,
    timeout_secs: u64,
    temperature: f32,
    max_tokens: usize,
}

impl LlmOcrEngine {
    /// Wrap `provider` with the OCR parameters from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ProcessConfig) -> Self {
        Self {
            provider,
            prompt_template: config.ocr_prompt.clone(),
            timeout_secs: config.ocr_timeout_secs,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl OcrEngine for LlmOcrEngine {
    async fn recognize(
        &self,
        image: ImageData,
        page_number: usize,
    ) -> Result<String, ServiceError> {
        let prompt = prompts::ocr_prompt(self.prompt_template.as_deref(), page_number);
        let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| ServiceError::Timeout {
                secs: self.timeout_secs,
            })?
            .map_err(|e| ServiceError::Api {
                detail: format!("{}", e),
            })?;

        debug!(
            "OCR page {}: {} chars, {} in / {} out tokens",
            page_number,
            response.content.len(),
            response.prompt_tokens,
            response.completion_tokens
        );

        Ok(response.content)
    }
}

//! Translation stage: translate one page's OCR output.
//!
//! Mirrors the OCR stage's policy exactly: one bounded call, no retries, no
//! response parsing, empty output is success. The caller guarantees the
//! input text is non-empty — this stage is never invoked for a page whose
//! OCR produced nothing, which is what keeps the "translated implies OCR'd"
//! invariant true by construction.

use crate::config::ProcessConfig;
use crate::error::ServiceError;
use crate::prompts;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The translation service boundary: source text in, translated text out.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` under the fixed domain rules.
    ///
    /// `Ok(String::new())` means the service answered but produced no text;
    /// it is not an error.
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Translator backed by a text chat model.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    prompt_template: Option<String>,
    timeout_secs: u64,
    temperature: f32,
    max_tokens: usize,
}

impl LlmTranslator {
    /// Wrap `provider` with the translation parameters from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ProcessConfig) -> Self {
        Self {
            provider,
            prompt_template: config.translation_prompt.clone(),
            timeout_secs: config.translation_timeout_secs,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let prompt = prompts::translation_prompt(self.prompt_template.as_deref(), text);
        let messages = vec![ChatMessage::user(prompt)];
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
            "Translation: {} chars in → {} chars out, {} / {} tokens",
            text.len(),
            response.content.len(),
            response.prompt_tokens,
            response.completion_tokens
        );

        Ok(response.content)
    }
}

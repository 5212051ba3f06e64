//! Instruction templates for the OCR and translation models.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction markers or a
//!    translation rule requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the rendered prompts
//!    directly without calling a real model.
//!
//! Callers can override either template via
//! [`crate::config::ProcessConfig::ocr_prompt`] /
//! [`crate::config::ProcessConfig::translation_prompt`]; the constants here
//! are used only when no override is provided.

/// OCR instruction template. `{page}` is replaced with the 1-based page
/// number.
///
/// The start/end markers are advisory: they ask the model to frame its
/// output, but the OCR stage never parses or enforces them — whatever the
/// service returns is recorded verbatim, markers included, and handed to
/// translation as-is.
pub const DEFAULT_OCR_PROMPT: &str = r#"Extract all text content from the provided single page image.
Format the output exactly like this:

==Start of OCR for page {page}==
[Text content of the page]
==End of OCR for page {page}==

- Extract the text content as accurately as possible between the markers.
"#;

/// Translation instruction template. `{text}` is replaced with the page's
/// OCR output.
///
/// The rules encode the domain this tool was built for: scanned Urdu works
/// on Islamic jurisprudence that freely interleave Arabic quotations. Urdu
/// is translated, Arabic is preserved verbatim, and a fixed glossary of
/// fiqhi terms is transliterated rather than translated so terminology stays
/// consistent across pages.
pub const DEFAULT_TRANSLATION_PROMPT: &str = r#"You are an expert translator specializing in Islamic jurisprudence texts from Urdu to English.
Translate the following text, which is OCR output from a single page of a scanned book. Adhere strictly to these rules:
1.  Translate **only the Urdu** portions into clear, accurate, and formal English suitable for the subject matter.
2.  Leave **all Arabic text** (like Qur'anic verses, Hadith snippets, standard Arabic phrases) **exactly as it is** in the original Arabic script. Do not translate or transliterate it.
3.  **Transliterate** common Islamic/fiqhi terms using a consistent scheme (e.g., Fiqh, Hadith, Sahabi, Imam, Sanad, Usul, Shar‘ī, Sunnah, Qur'an, ‘Alim, ‘Ulama’, Taqlid, Ijtihad, Fatwa, Halal, Haram). Do not translate these specific terms into English words like 'jurisprudence' or 'tradition'.
4.  Maintain the page structure indicated by the `==Start/End of OCR for page X==` markers. Translate the content between the markers.
5.  If you encounter ambiguous phrases or potential OCR errors in the Urdu, translate as best as possible and optionally add a brief translator note like `[TN: Possible OCR error for 'word']` or `[TN: Phrase interpretation...]`.

Input Text (Single Page):
{text}
"#;

/// Render the OCR prompt for a page. `template` defaults to
/// [`DEFAULT_OCR_PROMPT`]; a custom template may use `{page}` zero or more
/// times.
pub fn ocr_prompt(template: Option<&str>, page_number: usize) -> String {
    template
        .unwrap_or(DEFAULT_OCR_PROMPT)
        .replace("{page}", &page_number.to_string())
}

/// Render the translation prompt for a page's OCR output. A custom template
/// may place `{text}` wherever the source text belongs.
pub fn translation_prompt(template: Option<&str>, ocr_text: &str) -> String {
    template
        .unwrap_or(DEFAULT_TRANSLATION_PROMPT)
        .replace("{text}", ocr_text)
}

//! Fallback selection: pick the best non-blank candidate text.
//!
//! The priority order is deliberate: the high-fidelity, high-cost
//! OCR-plus-translation pipeline is trusted over the cheap text-layer
//! extraction whenever it produced *any* usable output, even if only a
//! subset of pages succeeded. Partial translation coverage beats a complete
//! raw dump of a scanned document, whose text layer is usually garbage or
//! absent anyway.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The quality/source level of the text ultimately selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Concatenated per-page translations from the OCR/translation pipeline.
    Translated,
    /// Whole-document raw text-layer extraction.
    Raw,
    /// No tier produced any text.
    None,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Translated => write!(f, "translated"),
            Tier::Raw => write!(f, "raw"),
            Tier::None => write!(f, "none"),
        }
    }
}

/// Choose the first non-blank candidate, top tier first.
///
/// "Blank" means empty or whitespace-only after trimming. Returns the chosen
/// text (owned, untrimmed) and the tier it came from; `("", Tier::None)`
/// when both candidates are blank.
pub fn select(translated: &str, raw: &str) -> (String, Tier) {
    if !translated.trim().is_empty() {
        (translated.to_string(), Tier::Translated)
    } else if !raw.trim().is_empty() {
        (raw.to_string(), Tier::Raw)
    } else {
        (String::new(), Tier::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translated_wins_regardless_of_raw() {
        let (text, tier) = select("Hello", "Bonjour");
        assert_eq!(text, "Hello");
        assert_eq!(tier, Tier::Translated);
    }

    #[test]
    fn raw_wins_when_translated_blank() {
        let (text, tier) = select("   \n\t ", "Page 1 text");
        assert_eq!(text, "Page 1 text");
        assert_eq!(tier, Tier::Raw);
    }

    #[test]
    fn both_blank_selects_none() {
        let (text, tier) = select("", "  \n ");
        assert_eq!(text, "");
        assert_eq!(tier, Tier::None);
    }

    #[test]
    fn selected_text_is_not_trimmed() {
        // Trimming is only used to decide blankness; the candidate itself is
        // passed through untouched.
        let (text, tier) = select("  body  ", "");
        assert_eq!(text, "  body  ");
        assert_eq!(tier, Tier::Translated);
    }

    #[test]
    fn tier_display_names() {
        assert_eq!(Tier::Translated.to_string(), "translated");
        assert_eq!(Tier::Raw.to_string(), "raw");
        assert_eq!(Tier::None.to_string(), "none");
    }

    #[test]
    fn tier_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Raw).unwrap(), "\"raw\"");
    }
}

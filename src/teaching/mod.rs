//! Classroom features built on the LLM: lesson plans, parent letters, grade
//! insights and chat, plus the static glossary and share-link codec.
//!
//! Each feature follows the same shape: validate a loosely typed request
//! into a strict input, render a prompt from templates, call the provider,
//! and (for structured results) pull JSON out of the reply.

pub mod chat;
pub mod extract;
pub mod glossary;
pub mod insights;
pub mod lesson;
pub mod letter;
pub mod prompt;
pub mod share;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::llm::ProviderError;

pub use extract::{ExtractError, extract_json, parse_json};
pub use prompt::{PromptBuilder, Prompts, Template};

/// Request rejected before any LLM call; maps to HTTP 400.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure after validation passed.
#[derive(Debug, Error)]
pub enum TeachingError {
    #[error(transparent)]
    Llm(#[from] ProviderError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Writing register a class prefers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Freundlich,
    Formell,
    Einfach,
}

impl Tone {
    /// Unknown or missing tones fall back to friendly.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("formell") => Tone::Formell,
            Some("einfach") => Tone::Einfach,
            _ => Tone::Freundlich,
        }
    }
}

/// Languages the chat can answer in and the glossary translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
    Tr,
    Uk,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Ar, Language::Tr, Language::Uk];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
            Language::Tr => "tr",
            Language::Uk => "uk",
        }
    }

    /// German display name, used in prompts and the UI language picker.
    pub fn label(self) -> &'static str {
        match self {
            Language::En => "Englisch",
            Language::Ar => "Arabisch",
            Language::Tr => "Türkisch",
            Language::Uk => "Ukrainisch",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code.trim())
    }
}

/// Read a JSON value the way a loose client sends numbers: a number, or a
/// numeric string. Anything else is `None`.
pub(crate) fn loose_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// A non-blank string field, trimmed.
pub(crate) fn required_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tone_fallback_is_friendly() {
        assert_eq!(Tone::parse_lenient(Some("formell")), Tone::Formell);
        assert_eq!(Tone::parse_lenient(Some("einfach")), Tone::Einfach);
        assert_eq!(Tone::parse_lenient(Some("locker")), Tone::Freundlich);
        assert_eq!(Tone::parse_lenient(None), Tone::Freundlich);
    }

    #[test]
    fn language_codes_round_trip() {
        for l in Language::ALL {
            assert_eq!(Language::from_code(l.code()), Some(l));
        }
        assert_eq!(Language::from_code("de"), None);
        assert_eq!(Language::Tr.label(), "Türkisch");
    }

    #[test]
    fn loose_numbers() {
        assert_eq!(loose_number(Some(&json!(8))), Some(8.0));
        assert_eq!(loose_number(Some(&json!(" 45 "))), Some(45.0));
        assert_eq!(loose_number(Some(&json!("acht"))), None);
        assert_eq!(loose_number(Some(&json!(null))), None);
        assert_eq!(loose_number(None), None);
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text(Some(&json!("  Bio "))), Some("Bio".into()));
        assert_eq!(required_text(Some(&json!("   "))), None);
        assert_eq!(required_text(Some(&json!(3))), None);
    }
}

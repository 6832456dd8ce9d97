//! JSON extraction from free-form model output.
//!
//! Models asked for "JSON only" still tend to wrap it in a Markdown fence.
//! [`extract_json`] strips the first fence if there is one; [`parse_json`]
//! then deserialises, retrying on the outermost `{…}` span when the model
//! added prose around an unfenced object.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fence pattern is valid"));

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model returned no JSON")]
    Empty,
    #[error("model returned invalid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Contents of the first ```` ``` ```` / ```` ```json ```` fence, trimmed;
/// otherwise the whole text, trimmed.
pub fn extract_json(text: &str) -> &str {
    match JSON_BLOCK.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => text.trim(),
    }
}

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let candidate = extract_json(text);
    if candidate.is_empty() {
        return Err(ExtractError::Empty);
    }
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first) => match outer_object(candidate) {
            Some(span) if span.len() < candidate.len() => Ok(serde_json::from_str(span)?),
            _ => Err(first.into()),
        },
    }
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
    }

    #[test]
    fn strips_json_fence() {
        let text = "Hier ist der Plan:\n```json\n{\"a\": 1}\n```\nViel Erfolg!";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(extract_json("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        assert_eq!(extract_json("  {\"a\": 2}\n"), "{\"a\": 2}");
    }

    #[test]
    fn first_fence_wins() {
        let text = "```json\n{\"a\": 1}\n```\n```json\n{\"a\": 2}\n```";
        assert_eq!(parse_json::<Sample>(text).unwrap(), Sample { a: 1 });
    }

    #[test]
    fn prose_around_unfenced_object() {
        let text = "Gerne! {\"a\": 7} Ich hoffe, das hilft.";
        assert_eq!(parse_json::<Sample>(text).unwrap(), Sample { a: 7 });
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(parse_json::<Sample>("keine Ahnung"), Err(ExtractError::Invalid(_))));
        assert!(matches!(parse_json::<Sample>("```json\n```"), Err(ExtractError::Empty)));
    }
}

//! Magic Chat: request normalisation and system prompt.
//!
//! The chat is answered either as a text stream (default) or, when an
//! answer language is requested, as one JSON reply. Translated answers skip
//! streaming so a failure surfaces as a clean error status rather than a
//! truncated body.

use serde::Deserialize;
use serde_json::Value;

use crate::llm::ChatTurn;

use super::{Language, Prompts, Template, ValidationError};

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<IncomingMessage>>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// How the answer goes back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Stream,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput {
    pub history: Vec<ChatTurn>,
    pub language: Option<Language>,
    pub delivery: Delivery,
}

/// `String(x ?? "")` — the text a loose client meant to send.
fn content_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl ChatRequest {
    pub fn validate(&self) -> Result<ChatInput, ValidationError> {
        let messages = match self.messages.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => return Err(ValidationError::new("messages array required")),
        };

        let last = &messages[messages.len() - 1];
        let last_ok = last.role.as_deref() == Some("user") && matches!(last.content, Some(Value::String(_)));
        if !last_ok {
            return Err(ValidationError::new("Last message must be user with content"));
        }

        let language = match self.language.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(Language::from_code(code).ok_or_else(|| {
                ValidationError::new("language must be one of en, ar, tr, uk")
            })?),
        };

        // Anything that is not explicitly the assistant speaks as the user.
        let history = messages
            .iter()
            .map(|m| {
                let text = content_text(m.content.as_ref());
                match m.role.as_deref() {
                    Some("assistant") => ChatTurn::assistant(text),
                    _ => ChatTurn::user(text),
                }
            })
            .collect();

        let delivery = if self.stream != Some(false) && language.is_none() {
            Delivery::Stream
        } else {
            Delivery::Json
        };

        Ok(ChatInput { history, language, delivery })
    }
}

impl ChatInput {
    pub fn system_prompt(&self, prompts: &Prompts) -> String {
        let builder = prompts.builder().layer(Template::ChatSystem);
        match self.language {
            Some(lang) => builder.layer(Template::ChatLanguage).var("language", lang.label()).build(),
            None => builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use serde_json::json;

    fn validate(body: Value) -> Result<ChatInput, ValidationError> {
        serde_json::from_value::<ChatRequest>(body).unwrap().validate()
    }

    #[test]
    fn streams_by_default() {
        let input = validate(json!({"messages": [{"role": "user", "content": "Quiz zu Brüchen"}]})).unwrap();
        assert_eq!(input.delivery, Delivery::Stream);
        assert_eq!(input.history, vec![ChatTurn::user("Quiz zu Brüchen")]);
    }

    #[test]
    fn language_or_stream_false_gives_json() {
        let input = validate(json!({"messages": [{"role": "user", "content": "hi"}], "stream": false})).unwrap();
        assert_eq!(input.delivery, Delivery::Json);
        let input = validate(json!({"messages": [{"role": "user", "content": "hi"}], "language": "tr"})).unwrap();
        assert_eq!(input.delivery, Delivery::Json);
        assert_eq!(input.language, Some(Language::Tr));
    }

    #[test]
    fn empty_or_missing_messages() {
        for body in [json!({}), json!({"messages": []})] {
            assert_eq!(validate(body).unwrap_err().0, "messages array required");
        }
    }

    #[test]
    fn last_must_be_user_text() {
        for last in [
            json!({"role": "assistant", "content": "x"}),
            json!({"role": "user"}),
            json!({"role": "user", "content": 42}),
        ] {
            let body = json!({"messages": [{"role": "user", "content": "a"}, last]});
            assert_eq!(validate(body).unwrap_err().0, "Last message must be user with content");
        }
    }

    #[test]
    fn roles_and_content_normalised() {
        let body = json!({"messages": [
            {"role": "system", "content": "sei nett"},
            {"role": "assistant", "content": null},
            {"content": 7},
            {"role": "user", "content": "weiter"}
        ]});
        let input = validate(body).unwrap();
        let roles: Vec<ChatRole> = input.history.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::User]);
        assert_eq!(input.history[1].content, "");
        assert_eq!(input.history[2].content, "7");
    }

    #[test]
    fn unknown_language_rejected() {
        let body = json!({"messages": [{"role": "user", "content": "hi"}], "language": "fr"});
        assert!(validate(body).is_err());
        let body = json!({"messages": [{"role": "user", "content": "hi"}], "language": " "});
        assert_eq!(validate(body).unwrap().language, None);
    }

    #[test]
    fn system_prompt_adds_language() {
        let prompts = Prompts::new("/nonexistent");
        let plain = validate(json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap();
        assert!(plain.system_prompt(&prompts).contains("Magic Chat"));
        assert!(!plain.system_prompt(&prompts).contains("Antworte ausschließlich"));
        let uk = validate(json!({"messages": [{"role": "user", "content": "hi"}], "language": "uk"})).unwrap();
        assert!(uk.system_prompt(&prompts).contains("Antworte ausschließlich auf Ukrainisch"));
    }
}

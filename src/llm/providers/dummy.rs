//! Dummy LLM provider — echoes the last user turn back prefixed with `[echo]`,
//! or returns a fixed reply. Used to exercise the HTTP surface without an
//! API key. A broken variant fails its stream after the reply, the way a
//! dropped upstream connection would.

use std::sync::Arc;

use futures_util::stream;

use crate::llm::{ChatTurn, ProviderError, TokenStream};

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    reply: Option<Arc<str>>,
    break_stream: bool,
}

impl DummyProvider {
    pub fn echo() -> Self {
        Self { reply: None, break_stream: false }
    }

    /// Always answer with `reply`, whatever the prompt.
    pub fn with_reply(reply: impl Into<Arc<str>>) -> Self {
        Self { reply: Some(reply.into()), break_stream: false }
    }

    /// Stream `reply`, then end with a request error.
    pub fn broken_stream(reply: impl Into<Arc<str>>) -> Self {
        Self { reply: Some(reply.into()), break_stream: true }
    }

    fn answer(&self, history: &[ChatTurn]) -> String {
        match &self.reply {
            Some(reply) => reply.to_string(),
            None => {
                let last = history.last().map(|t| t.content.as_str()).unwrap_or_default();
                format!("[echo] {last}")
            }
        }
    }

    pub async fn chat(&self, history: &[ChatTurn], _system: Option<&str>) -> Result<String, ProviderError> {
        Ok(self.answer(history))
    }

    /// Streams the answer word by word, whitespace kept with the word.
    pub async fn chat_stream(
        &self,
        history: &[ChatTurn],
        _system: Option<&str>,
    ) -> Result<TokenStream, ProviderError> {
        let mut chunks: Vec<Result<String, ProviderError>> = self
            .answer(history)
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        if self.break_stream {
            chunks.push(Err(ProviderError::Request("connection reset".into())));
        }
        Ok(Box::pin(stream::iter(chunks)))
    }
}

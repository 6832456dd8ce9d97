//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Every request is a single round-trip; history is supplied by the caller.

pub mod providers;
pub mod sse;

use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("invalid chat history: {0}")]
    InvalidHistory(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("empty or missing content in response")]
    EmptyResponse,
}

// ── Chat turns ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Incremental text chunks from a streaming completion. Empty chunks are
/// never yielded; an `Err` item ends the stream.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// The last turn must come from the user — that is the turn being answered.
pub(crate) fn ensure_user_last(history: &[ChatTurn]) -> Result<(), ProviderError> {
    match history.last() {
        Some(turn) if turn.role == ChatRole::User => Ok(()),
        Some(_) => Err(ProviderError::InvalidHistory("last message must be user".into())),
        None => Err(ProviderError::InvalidHistory("history is empty".into())),
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Gemini(providers::gemini::GeminiProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Gemini(_) => "gemini",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }

    /// Whether the provider can make requests. Handlers check this before
    /// building a prompt so a missing key surfaces as a config error.
    pub fn has_credentials(&self) -> bool {
        match self {
            LlmProvider::Dummy(_) => true,
            LlmProvider::Gemini(p) => p.has_api_key(),
            LlmProvider::OpenAiCompatible(p) => p.has_api_key(),
        }
    }

    /// One-shot completion of a single prompt.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, ProviderError> {
        self.chat(&[ChatTurn::user(prompt)], system).await
    }

    /// Answer the last user turn of `history`.
    pub async fn chat(&self, history: &[ChatTurn], system: Option<&str>) -> Result<String, ProviderError> {
        ensure_user_last(history)?;
        match self {
            LlmProvider::Dummy(p) => p.chat(history, system).await,
            LlmProvider::Gemini(p) => p.chat(history, system).await,
            LlmProvider::OpenAiCompatible(p) => p.chat(history, system).await,
        }
    }

    /// Like [`chat`](Self::chat) but yields the answer as it is generated.
    pub async fn chat_stream(
        &self,
        history: &[ChatTurn],
        system: Option<&str>,
    ) -> Result<TokenStream, ProviderError> {
        ensure_user_last(history)?;
        match self {
            LlmProvider::Dummy(p) => p.chat_stream(history, system).await,
            LlmProvider::Gemini(p) => p.chat_stream(history, system).await,
            LlmProvider::OpenAiCompatible(p) => p.chat_stream(history, system).await,
        }
    }
}

//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Covers OpenAI itself and compatible local servers (Ollama, LM Studio…).
//! All OpenAI wire types are private to this module — callers never see them.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::sse;
use crate::llm::{ChatRole, ChatTurn, ProviderError, TokenStream};

use super::check_status;

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url,
            model,
            temperature,
            timeout: Duration::from_secs(timeout_seconds),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Local servers run keyless, so only remote endpoints require a key.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || is_local(&self.api_base_url)
    }

    fn payload(&self, history: &[ChatTurn], system: Option<&str>, stream: bool) -> ChatCompletionRequest {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") { None } else { Some(self.temperature) };

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(sys) = system {
            messages.push(Message { role: "system".to_string(), content: sys.to_string() });
        }
        messages.extend(history.iter().map(|t| Message {
            role: match t.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            }
            .to_string(),
            content: t.content.clone(),
        }));

        ChatCompletionRequest { model: self.model.clone(), messages, temperature, stream }
    }

    fn request(&self, payload: &ChatCompletionRequest) -> reqwest::RequestBuilder {
        let mut req = self.client.post(&self.api_base_url).json(payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    pub async fn chat(&self, history: &[ChatTurn], system: Option<&str>) -> Result<String, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::MissingApiKey);
        }
        let payload = self.payload(history, system, false);

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            turns = history.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let response = self.request(&payload).timeout(self.timeout).send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    pub async fn chat_stream(
        &self,
        history: &[ChatTurn],
        system: Option<&str>,
    ) -> Result<TokenStream, ProviderError> {
        if !self.has_api_key() {
            return Err(ProviderError::MissingApiKey);
        }
        let payload = self.payload(history, system, true);
        debug!(model = %payload.model, turns = history.len(), "opening LLM stream");

        let response = self.request(&payload).send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM stream request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;
        Ok(sse::relay(Box::pin(response.bytes_stream()), stream_delta))
    }
}

fn is_local(url: &str) -> bool {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.starts_with("localhost") || rest.starts_with("127.0.0.1") || rest.starts_with("[::1]")
}

fn stream_delta(payload: &str) -> Result<Option<String>, ProviderError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(payload)
        .map_err(|e| ProviderError::Request(format!("malformed stream chunk: {e}")))?;
    Ok(chunk.choices.into_iter().next().and_then(|c| c.delta.content))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

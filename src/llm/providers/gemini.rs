//! Google Gemini provider (Generative Language REST API).
//!
//! - one-shot: `POST {base}/models/{model}:generateContent`
//! - streaming: `POST {base}/models/{model}:streamGenerateContent?alt=sse`
//!
//! The key travels in the `x-goog-api-key` header. Gemini calls the
//! assistant role `model`; the system prompt goes into `systemInstruction`.
//! Wire types are private to this module.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::sse;
use crate::llm::{ChatRole, ChatTurn, ProviderError, TokenStream};

use super::check_status;

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    api_key: Option<String>,
}

impl GeminiProvider {
    /// The HTTP client carries only a connect timeout; the full request
    /// timeout is applied to one-shot calls so long streams are not cut off.
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
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
            timeout: Duration::from_secs(timeout_seconds),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{method}", self.api_base_url, self.model)
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }

    fn payload(&self, history: &[ChatTurn], system: Option<&str>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: history.iter().map(Content::from_turn).collect(),
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part { text: Some(s.to_string()) }],
            }),
            generation_config: GenerationConfig { temperature: self.temperature },
        }
    }

    pub async fn chat(&self, history: &[ChatTurn], system: Option<&str>) -> Result<String, ProviderError> {
        let key = self.key()?;
        let payload = self.payload(history, system);

        debug!(model = %self.model, turns = history.len(), "sending Gemini request");
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full Gemini request payload");
        }

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Gemini HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<GenerateContentResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize Gemini response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        let text = parsed.into_text()?;
        debug!(len = text.len(), "received Gemini response");
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    pub async fn chat_stream(
        &self,
        history: &[ChatTurn],
        system: Option<&str>,
    ) -> Result<TokenStream, ProviderError> {
        let key = self.key()?;
        let payload = self.payload(history, system);

        debug!(model = %self.model, turns = history.len(), "opening Gemini stream");

        let response = self
            .client
            .post(self.endpoint("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Gemini stream request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;
        Ok(sse::relay(Box::pin(response.bytes_stream()), stream_delta))
    }
}

/// Text carried by one streamed `GenerateContentResponse` chunk.
fn stream_delta(payload: &str) -> Result<Option<String>, ProviderError> {
    let chunk: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| ProviderError::Request(format!("malformed stream chunk: {e}")))?;
    if let Some(reason) = chunk.block_reason() {
        return Err(ProviderError::Request(format!("prompt blocked: {reason}")));
    }
    Ok(Some(chunk.text()))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn from_turn(turn: &ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: Some(turn.content.clone()) }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref())
    }

    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }

    fn into_text(self) -> Result<String, ProviderError> {
        if let Some(reason) = self.block_reason() {
            return Err(ProviderError::Request(format!("prompt blocked: {reason}")));
        }
        if self.candidates.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(self.text())
    }
}

//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the server consumes.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Server ───────────────────────────────────────────────────────────────────

/// HTTP listener and filesystem layout.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the axum listener binds to.
    pub bind: String,
    /// Directory holding prompt templates; missing files fall back to the
    /// built-in copies.
    pub prompts_dir: PathBuf,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Gemini (Google Generative Language API) configuration.
/// Populated from `[llm.gemini]` in the TOML.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base_url: String,
    /// Model name; `GEMINI_MODEL` overrides the TOML value.
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"gemini"`, `"openai"`, `"dummy"`).
    pub provider: String,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of chat sessions kept; `None` keeps everything.
    pub chat_session_cap: Option<usize>,
}

// ── Root ─────────────────────────────────────────────────────────────────────

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Root for persisted state (`<work_dir>/state/*.json`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    /// Sourced from `GEMINI_API_KEY` / `LLM_API_KEY`, never from TOML.
    pub llm_api_key: Option<String>,
    pub store: StoreConfig,
}

impl Config {
    /// Directory the JSON state documents live in.
    pub fn state_dir(&self) -> PathBuf {
        self.work_dir.join("state")
    }
}

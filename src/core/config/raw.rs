//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    pub server: RawServer,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub store: RawStore,
}

#[derive(Deserialize)]
pub(super) struct RawServer {
    pub name: String,
    pub work_dir: String,
    pub log_level: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub gemini: RawGeminiConfig,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            gemini: RawGeminiConfig::default(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawGeminiConfig {
    #[serde(default = "default_gemini_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawGeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawStore {
    #[serde(default)]
    pub chat_session_cap: Option<usize>,
}

// ── Default functions (used by serde) ────────────────────────────────────────

pub(super) fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

pub(super) fn default_prompts_dir() -> String {
    "config/prompts".to_string()
}

pub(super) fn default_llm_provider() -> String {
    "gemini".to_string()
}

pub(super) fn default_gemini_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
pub(super) fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}
pub(super) fn default_openai_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
pub(super) fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
pub(super) fn default_temperature() -> f32 {
    0.7
}
pub(super) fn default_timeout_seconds() -> u64 {
    120
}

//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `NAGGY_*` and `GEMINI_MODEL` env overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs (`Config`, `LlmConfig`, …).
//! - **raw** — Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, hardcoded_default, load, load_from};
pub use types::*;

impl Config {
    /// Safe `Config` for tests — dummy LLM, no API keys, no external calls.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            server: ServerConfig {
                bind: "127.0.0.1:0".into(),
                prompts_dir: work_dir.join("prompts"),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                gemini: GeminiConfig {
                    api_base_url: "http://localhost:0/v1beta".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            store: StoreConfig { chat_session_cap: None },
        }
    }
}

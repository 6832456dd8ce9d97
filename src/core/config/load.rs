//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `NAGGY_WORK_DIR`, `NAGGY_LOG_LEVEL`, `NAGGY_BIND` and
//! `GEMINI_MODEL` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;

/// Env-derived values that win over the TOML file.
///
/// Tests build this directly instead of mutating process env.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub gemini_model: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("NAGGY_WORK_DIR").ok(),
            log_level: env::var("NAGGY_LOG_LEVEL").ok(),
            bind: env::var("NAGGY_BIND").ok(),
            gemini_model: env::var("GEMINI_MODEL").ok().filter(|m| !m.trim().is_empty()),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, returns a hardcoded default.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        Ok(hardcoded_default(&overrides))
    }
}

/// Built-in configuration used when no TOML file is available.
pub fn hardcoded_default(overrides: &Overrides) -> Config {
    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or("~/.naggy"));

    Config {
        name: "naggy".to_string(),
        work_dir,
        log_level: overrides.log_level.clone().unwrap_or_else(|| "info".to_string()),
        server: ServerConfig {
            bind: overrides.bind.clone().unwrap_or_else(raw::default_bind),
            prompts_dir: PathBuf::from(raw::default_prompts_dir()),
        },
        llm: LlmConfig {
            provider: raw::default_llm_provider(),
            gemini: GeminiConfig {
                api_base_url: raw::default_gemini_api_base_url(),
                model: overrides.gemini_model.clone().unwrap_or_else(raw::default_gemini_model),
                temperature: raw::default_temperature(),
                timeout_seconds: raw::default_timeout_seconds(),
            },
            openai: OpenAiConfig {
                api_base_url: raw::default_openai_api_base_url(),
                model: raw::default_openai_model(),
                temperature: raw::default_temperature(),
                timeout_seconds: raw::default_timeout_seconds(),
            },
        },
        llm_api_key: api_key_from_env(),
        store: StoreConfig { chat_session_cap: None },
    }
}

/// Internal loader — accepts an explicit path and overrides.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    let s = parsed.server;

    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&s.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(s.log_level);
    let bind = overrides.bind.clone().unwrap_or(s.bind);

    // Relative prompt dirs resolve against the config file, so `-f` works
    // from any cwd.
    let prompts_dir = {
        let p = expand_home(&s.prompts_dir);
        if p.is_absolute() || p.exists() {
            p
        } else {
            path.parent()
                .and_then(|dir| dir.parent())
                .map(|root| root.join(&p))
                .filter(|candidate| candidate.exists())
                .unwrap_or(p)
        }
    };

    Ok(Config {
        name: s.name,
        work_dir,
        log_level,
        server: ServerConfig { bind, prompts_dir },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            gemini: GeminiConfig {
                api_base_url: parsed.llm.gemini.api_base_url,
                model: overrides.gemini_model.clone().unwrap_or(parsed.llm.gemini.model),
                temperature: parsed.llm.gemini.temperature,
                timeout_seconds: parsed.llm.gemini.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: api_key_from_env(),
        store: StoreConfig {
            chat_session_cap: parsed.store.chat_session_cap.filter(|cap| *cap > 0),
        },
    })
}

fn api_key_from_env() -> Option<String> {
    env::var("GEMINI_API_KEY")
        .ok()
        .or_else(|| env::var("LLM_API_KEY").ok())
        .filter(|k| !k.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

//! Persisted state, one JSON file per store under `<work_dir>/state/`.
//!
//! Stores are process-local. Each serialises its own writes; there is no
//! merging between concurrent clients, the last write wins.

pub mod auth;
pub mod chat;
pub mod classes;
mod doc;

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::AppError;

pub use auth::AuthStore;
pub use chat::{ChatSessionUpdate, ChatStore};
pub use classes::ClassesStore;
pub use doc::JsonDoc;

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct Stores {
    pub classes: ClassesStore,
    pub chat: ChatStore,
    pub auth: AuthStore,
}

impl Stores {
    pub fn open(config: &Config) -> Result<Self, AppError> {
        Self::open_in(&config.state_dir(), config.store.chat_session_cap)
    }

    pub fn open_in(state_dir: &Path, chat_session_cap: Option<usize>) -> Result<Self, AppError> {
        let stores = Self {
            classes: ClassesStore::open(state_dir)?,
            chat: ChatStore::open(state_dir, chat_session_cap)?,
            auth: AuthStore::open(state_dir)?,
        };
        info!(dir = %state_dir.display(), "stores opened");
        Ok(stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn timestamps_are_utc_millis() {
        let ts = now_rfc3339();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len());
    }

    #[tokio::test]
    async fn open_uses_state_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config::test_default(dir.path());
        let stores = Stores::open(&config).unwrap();
        stores.auth.login(auth::Role::Lehrer, "Frau Weber").await.unwrap();
        assert!(dir.path().join("state").join(auth::FILE_NAME).exists());
    }
}

//! Magic Chat history: saved conversations, newest first.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::llm::ChatRole;
use crate::teaching::Language;

use super::JsonDoc;

pub const FILE_NAME: &str = "naggy-magic-chat-history.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub created_at: String,
    pub title: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub messages: Vec<ChatMessageRecord>,
}

/// Body of an upsert. `topic` tells a missing key (keep the stored topic)
/// apart from an explicit `null` (clear it).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionUpdate {
    pub id: String,
    pub created_at: String,
    pub title: String,
    #[serde(default, deserialize_with = "present")]
    pub topic: Option<Option<String>>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub messages: Vec<ChatMessageRecord>,
}

/// Only runs when the key is there, so `null` becomes `Some(None)`.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

impl ChatSessionUpdate {
    fn into_session(self, created_at: String, stored_topic: Option<String>) -> ChatSession {
        ChatSession {
            id: self.id,
            created_at,
            title: self.title,
            topic: self.topic.unwrap_or(stored_topic),
            language: self.language,
            messages: self.messages,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatHistory {
    pub sessions: Vec<ChatSession>,
}

pub struct ChatStore {
    doc: JsonDoc<ChatHistory>,
    /// `usize::MAX` when uncapped.
    cap: usize,
}

impl ChatStore {
    pub fn open(state_dir: &Path, cap: Option<usize>) -> Result<Self, AppError> {
        Ok(Self {
            doc: JsonDoc::open(state_dir.join(FILE_NAME))?,
            cap: cap.unwrap_or(usize::MAX),
        })
    }

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.doc.snapshot().await.sessions
    }

    /// Insert a new session at the front, or replace an existing one in
    /// place. Replacing keeps the stored `createdAt`, and the stored `topic`
    /// unless the update names one or sends `null`. Returns the session as
    /// stored.
    pub async fn upsert_session(&self, update: ChatSessionUpdate) -> Result<ChatSession, AppError> {
        let cap = self.cap;
        self.doc
            .update(move |h| match h.sessions.iter().position(|s| s.id == update.id) {
                Some(idx) => {
                    let current = &mut h.sessions[idx];
                    let created_at = std::mem::take(&mut current.created_at);
                    let topic = current.topic.take();
                    *current = update.into_session(created_at, topic);
                    current.clone()
                }
                None => {
                    let created_at = update.created_at.clone();
                    let session = update.into_session(created_at, None);
                    h.sessions.insert(0, session.clone());
                    h.sessions.truncate(cap);
                    session
                }
            })
            .await
    }

    /// Returns whether a session was removed.
    pub async fn delete_session(&self, id: &str) -> Result<bool, AppError> {
        self.doc
            .update(|h| {
                let before = h.sessions.len();
                h.sessions.retain(|s| s.id != id);
                h.sessions.len() != before
            })
            .await
    }

    pub async fn clear_sessions(&self) -> Result<(), AppError> {
        self.doc.update(|h| h.sessions.clear()).await
    }
}

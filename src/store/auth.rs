//! Who is using this installation, and in which role. Nothing checks this;
//! clients use it to pick the teacher or student view.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

use super::JsonDoc;

pub const FILE_NAME: &str = "naggy-auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "lehrer")]
    Lehrer,
    #[serde(rename = "schüler", alias = "schueler")]
    Schueler,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthState {
    pub user: Option<User>,
}

pub struct AuthStore {
    doc: JsonDoc<AuthState>,
}

impl AuthStore {
    pub fn open(state_dir: &Path) -> Result<Self, AppError> {
        Ok(Self { doc: JsonDoc::open(state_dir.join(FILE_NAME))? })
    }

    pub async fn user(&self) -> Option<User> {
        self.doc.snapshot().await.user
    }

    /// Blank names are ignored and leave the current user in place.
    pub async fn login(&self, role: Role, name: &str) -> Result<Option<User>, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let user = User { role, name: name.to_string() };
        let stored = user.clone();
        self.doc.update(move |s| s.user = Some(stored)).await?;
        info!(role = ?user.role, "user logged in");
        Ok(Some(user))
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.doc.update(|s| s.user = None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Schueler).unwrap(), "\"schüler\"");
        assert_eq!(serde_json::from_str::<Role>("\"schueler\"").unwrap(), Role::Schueler);
        assert_eq!(serde_json::from_str::<Role>("\"lehrer\"").unwrap(), Role::Lehrer);
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }

    #[tokio::test]
    async fn login_trims_and_ignores_blank() {
        let dir = TempDir::new().unwrap();
        let store = AuthStore::open(dir.path()).unwrap();
        let user = store.login(Role::Lehrer, "  Frau Yilmaz ").await.unwrap().unwrap();
        assert_eq!(user.name, "Frau Yilmaz");

        assert!(store.login(Role::Schueler, "   ").await.unwrap().is_none());
        assert_eq!(store.user().await, Some(user));
    }

    #[tokio::test]
    async fn logout_persists() {
        let dir = TempDir::new().unwrap();
        let store = AuthStore::open(dir.path()).unwrap();
        store.login(Role::Schueler, "Ali").await.unwrap();
        store.logout().await.unwrap();
        let reopened = AuthStore::open(dir.path()).unwrap();
        assert!(reopened.user().await.is_none());
    }
}

//! `JsonDoc<T>` — one serde document mirrored to one JSON file.
//!
//! The in-memory copy is authoritative. Every mutation runs against a clone
//! while the lock is held, the clone is written to `<name>.json.tmp` and
//! renamed over the real file, and only then becomes the new state. A failed
//! write leaves both the file and memory untouched. Updates that change
//! nothing skip the write.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppError;

#[derive(Debug)]
pub struct JsonDoc<T> {
    path: PathBuf,
    state: Mutex<T>,
}

impl<T> JsonDoc<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq,
{
    /// Load `path`, or start from `T::default()` if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| AppError::Store(format!("malformed {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => {
                return Err(AppError::Store(format!("cannot read {}: {e}", path.display())));
            }
        };
        Ok(Self { path, state: Mutex::new(state) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> T {
        self.state.lock().await.clone()
    }

    /// Apply `f` and persist. The closure's return value is passed through.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, AppError> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next);
        if next != *guard {
            write_atomic(&self.path, &next).await?;
            *guard = next;
        }
        Ok(out)
    }
}

async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Store(format!("serialise {}: {e}", path.display())))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Store(format!("cannot create {}: {e}", parent.display())))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &data)
        .await
        .map_err(|e| AppError::Store(format!("cannot write {}: {e}", tmp.display())))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(AppError::Store(format!("cannot replace {}: {e}", path.display())));
    }

    debug!(path = %path.display(), bytes = data.len(), "store written");
    Ok(())
}

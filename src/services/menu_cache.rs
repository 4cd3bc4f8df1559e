use crate::{models::MenuSnapshot, utils::AppError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Single-file store for the current menu snapshot.
///
/// `replace` writes a sibling temp file and renames it over the cache, so a
/// reader sees either the previous snapshot or the new one, never a partial
/// write. There is no lock: a read racing a refresh can still return the
/// previous snapshot.
#[derive(Debug, Clone)]
pub struct MenuCache {
    path: PathBuf,
}

impl MenuCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot file is present, without reading or parsing it
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    pub async fn load(&self) -> Result<MenuSnapshot, AppError> {
        let bytes = fs::read(&self.path).await.map_err(|e| {
            AppError::CacheUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::CacheUnavailable(format!("{} is corrupt: {}", self.path.display(), e))
        })
    }

    pub async fn replace(&self, snapshot: &MenuSnapshot) -> Result<(), AppError> {
        let contents = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::CacheUnavailable(format!("Failed to encode menu: {}", e)))?;

        let tmp_path = self.temp_path();

        if let Err(e) = fs::write(&tmp_path, &contents).await {
            return Err(AppError::CacheUnavailable(format!(
                "Failed to write {}: {}",
                tmp_path.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(AppError::CacheUnavailable(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        log::debug!("💾 Menu snapshot written to {}", self.path.display());

        Ok(())
    }

    // Same directory as the target so the rename never crosses filesystems
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "menu".to_string());

        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
    }
}

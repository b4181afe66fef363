//! Timestamped backups taken before any file mutation
//!
//! A backup is a plain copy named `"<stem>_<YYYYMMDD_HHMMSS_mmm>.<ext>"`
//! inside the backup directory. It is the only undo mechanism for Apply.

use crate::services::file_organizer::unique_path;
use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Backup failed for {path}: {source}")]
    CopyFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid backup name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Organize(#[from] crate::services::file_organizer::OrganizeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    backup_dir: PathBuf,
}

impl BackupStore {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `path` into the backup directory, returning the backup path
    pub async fn backup(&self, path: &Path) -> Result<PathBuf, BackupError> {
        if !path.exists() {
            return Err(BackupError::FileNotFound(path.display().to_string()));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| BackupError::InvalidName(path.display().to_string()))?;
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");

        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let target = unique_path(&self.backup_dir.join(format!("{}_{}{}", stem, timestamp, ext)))?;

        tokio::fs::copy(path, &target)
            .await
            .map_err(|source| BackupError::CopyFailed {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(
            file = %path.display(),
            backup = %target.display(),
            "Backup created"
        );
        Ok(target)
    }

    /// Copy a backup back over (or to) `target`
    pub async fn restore(&self, backup_path: &Path, target: &Path) -> Result<(), BackupError> {
        if !backup_path.exists() {
            return Err(BackupError::FileNotFound(backup_path.display().to_string()));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(backup_path, target)
            .await
            .map_err(|source| BackupError::CopyFailed {
                path: backup_path.display().to_string(),
                source,
            })?;

        tracing::info!(
            backup = %backup_path.display(),
            target = %target.display(),
            "Backup restored"
        );
        Ok(())
    }

    /// Backups currently in the store, sorted by name
    pub async fn list(&self) -> Result<Vec<PathBuf>, BackupError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.backup_dir).await?;
        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                backups.push(entry.path());
            }
        }
        backups.sort();
        Ok(backups)
    }
}

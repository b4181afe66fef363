//! Audio tag writing
//!
//! The applier only sees [`TagWriter`]; [`LoftyTagWriter`] writes the
//! file's primary tag, creating it when the file has none.

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag writing errors
#[derive(Debug, Error)]
pub enum TagWriteError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read tags: {0}")]
    ReadError(String),

    #[error("File format does not support tags: {0}")]
    Unsupported(String),

    #[error("Failed to write tags: {0}")]
    WriteError(String),

    #[error("Task join error: {0}")]
    JoinError(String),
}

/// Fields to write; `None` leaves the existing value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub track: Option<u32>,
}

impl TagUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.track.is_none()
    }
}

#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn write_tags(&self, path: &Path, update: &TagUpdate) -> Result<(), TagWriteError>;
}

/// lofty-backed tag writer
#[derive(Debug, Clone, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    pub fn new() -> Self {
        Self
    }
}

fn write_primary_tag(path: &Path, update: &TagUpdate) -> Result<(), TagWriteError> {
    if !path.exists() {
        return Err(TagWriteError::FileNotFound(path.display().to_string()));
    }

    let mut tagged_file = Probe::open(path)
        .map_err(|e| TagWriteError::ReadError(e.to_string()))?
        .read()
        .map_err(|e| TagWriteError::ReadError(e.to_string()))?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| {
        TagWriteError::Unsupported(format!("{} ({:?})", path.display(), tag_type))
    })?;

    if let Some(title) = &update.title {
        tag.set_title(title.clone());
    }
    if let Some(artist) = &update.artist {
        tag.set_artist(artist.clone());
    }
    if let Some(album) = &update.album {
        tag.set_album(album.clone());
    }
    if let Some(year) = update.year.and_then(|y| u32::try_from(y).ok()) {
        tag.set_year(year);
    }
    if let Some(genre) = &update.genre {
        tag.set_genre(genre.clone());
    }
    if let Some(track) = update.track {
        tag.set_track(track);
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TagWriteError::WriteError(e.to_string()))?;

    tracing::debug!(file = %path.display(), tag_type = ?tag_type, "Tags written");
    Ok(())
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write_tags(&self, path: &Path, update: &TagUpdate) -> Result<(), TagWriteError> {
        if update.is_empty() {
            return Ok(());
        }

        let path: PathBuf = path.to_path_buf();
        let update = update.clone();
        tokio::task::spawn_blocking(move || write_primary_tag(&path, &update))
            .await
            .map_err(|e| TagWriteError::JoinError(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_empty() {
        assert!(TagUpdate::default().is_empty());
        let update = TagUpdate {
            track: Some(3),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let update = TagUpdate {
            title: Some("Lithium".to_string()),
            ..Default::default()
        };
        let result = LoftyTagWriter::new()
            .write_tags(&dir.path().join("missing.mp3"), &update)
            .await;
        assert!(matches!(result, Err(TagWriteError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_non_audio_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not audio").unwrap();
        let update = TagUpdate {
            title: Some("Lithium".to_string()),
            ..Default::default()
        };
        let result = LoftyTagWriter::new().write_tags(&path, &update).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"not audio");
    }
}

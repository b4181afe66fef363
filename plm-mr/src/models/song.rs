//! Catalog song record
//!
//! Owned by the catalog store. The pipeline reads it and rewrites a subset of
//! fields; it never creates or deletes records.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Catalog song identifier
pub type SongId = i64;

/// One song as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub id: SongId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub file_path: PathBuf,
    /// Bitrate in kbps
    pub bitrate: Option<u32>,
}

impl SongRecord {
    /// Title, treating a missing value as empty
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Artist, treating a missing value as empty
    pub fn artist_str(&self) -> &str {
        self.artist.as_deref().unwrap_or("")
    }

    /// Album, treating a missing value as empty
    pub fn album_str(&self) -> &str {
        self.album.as_deref().unwrap_or("")
    }
}

/// Partial update applied to a catalog record
///
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub file_path: Option<PathBuf>,
}

impl SongUpdate {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.year.is_none()
            && self.file_path.is_none()
    }
}

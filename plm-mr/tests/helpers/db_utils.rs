//! Database Test Utilities
//!
//! In-memory SQLite catalog plus song fixtures

use anyhow::Result;
use plm_mr::db::init_tables;
use plm_mr::db::songs::SqliteCatalog;
use plm_mr::models::{SongId, SongRecord};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use std::sync::Arc;

/// Fresh catalog backed by `sqlite::memory:`
///
/// One connection only: every new in-memory connection is a new database.
pub async fn memory_catalog() -> Result<Arc<SqliteCatalog>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(Arc::new(SqliteCatalog::new(pool)))
}

/// Song record with no id yet
pub fn song(
    title: Option<&str>,
    artist: Option<&str>,
    album: Option<&str>,
    duration: Option<f64>,
    file_path: &Path,
) -> SongRecord {
    SongRecord {
        id: 0,
        title: title.map(String::from),
        artist: artist.map(String::from),
        album: album.map(String::from),
        year: None,
        duration,
        file_path: file_path.to_path_buf(),
        bitrate: None,
    }
}

/// Insert songs in order, returning their ids
pub async fn seed_songs(catalog: &SqliteCatalog, songs: &[SongRecord]) -> Result<Vec<SongId>> {
    let mut ids = Vec::with_capacity(songs.len());
    for song in songs {
        ids.push(catalog.insert_song(song).await?);
    }
    Ok(ids)
}

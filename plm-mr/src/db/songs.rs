//! Song catalog operations
//!
//! The pipeline reaches the catalog only through [`SongCatalog`]; the
//! SQLite implementation is what the binary wires in.

use crate::models::{SongId, SongRecord, SongUpdate};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::path::PathBuf;
use thiserror::Error;

/// Catalog store errors
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    #[error("Song {0} not found")]
    NotFound(SongId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent song catalog
#[async_trait]
pub trait SongCatalog: Send + Sync {
    async fn get_all_songs(&self) -> Result<Vec<SongRecord>, CatalogStoreError>;

    /// `Ok(None)` when no song has this id
    async fn get_song_by_id(&self, id: SongId) -> Result<Option<SongRecord>, CatalogStoreError>;

    /// Apply a partial update; `NotFound` when the id does not exist
    async fn update_song(&self, id: SongId, update: &SongUpdate) -> Result<(), CatalogStoreError>;

    async fn delete_song(&self, id: SongId) -> Result<(), CatalogStoreError>;
}

/// SQLite-backed catalog
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a song and return its id
    ///
    /// Used by the importing application and by tests; the pipeline itself
    /// never creates records.
    pub async fn insert_song(&self, song: &SongRecord) -> Result<SongId, CatalogStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO songs (title, artist, album, year, duration, file_path, bitrate)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(song.year)
        .bind(song.duration)
        .bind(song.file_path.to_string_lossy().to_string())
        .bind(song.bitrate.map(i64::from))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

fn row_to_song(row: &SqliteRow) -> SongRecord {
    let file_path: String = row.get("file_path");
    let year: Option<i64> = row.get("year");
    let bitrate: Option<i64> = row.get("bitrate");

    SongRecord {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        year: year.and_then(|y| i32::try_from(y).ok()),
        duration: row.get("duration"),
        file_path: PathBuf::from(file_path),
        bitrate: bitrate.and_then(|b| u32::try_from(b).ok()),
    }
}

#[async_trait]
impl SongCatalog for SqliteCatalog {
    async fn get_all_songs(&self) -> Result<Vec<SongRecord>, CatalogStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, artist, album, year, duration, file_path, bitrate
            FROM songs
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_song).collect())
    }

    async fn get_song_by_id(&self, id: SongId) -> Result<Option<SongRecord>, CatalogStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, artist, album, year, duration, file_path, bitrate
            FROM songs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_song))
    }

    async fn update_song(&self, id: SongId, update: &SongUpdate) -> Result<(), CatalogStoreError> {
        // NULL parameters keep the current column value
        let result = sqlx::query(
            r#"
            UPDATE songs SET
                title = COALESCE(?, title),
                artist = COALESCE(?, artist),
                album = COALESCE(?, album),
                year = COALESCE(?, year),
                file_path = COALESCE(?, file_path)
            WHERE id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.artist)
        .bind(&update.album)
        .bind(update.year)
        .bind(
            update
                .file_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::NotFound(id));
        }

        tracing::debug!(song_id = id, "Catalog record updated");
        Ok(())
    }

    async fn delete_song(&self, id: SongId) -> Result<(), CatalogStoreError> {
        let result = sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_catalog() -> SqliteCatalog {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        SqliteCatalog::new(pool)
    }

    fn song(title: &str) -> SongRecord {
        SongRecord {
            id: 0,
            title: Some(title.to_string()),
            artist: None,
            album: Some("Nevermind".to_string()),
            year: None,
            duration: Some(301.5),
            file_path: PathBuf::from("/music/a.mp3"),
            bitrate: Some(320),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let catalog = setup_test_catalog().await;
        let id = catalog.insert_song(&song("Lithium")).await.unwrap();

        let loaded = catalog.get_song_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.title.as_deref(), Some("Lithium"));
        assert_eq!(loaded.artist, None);
        assert_eq!(loaded.duration, Some(301.5));
        assert_eq!(loaded.bitrate, Some(320));
        assert_eq!(loaded.file_path, PathBuf::from("/music/a.mp3"));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_columns() {
        let catalog = setup_test_catalog().await;
        let id = catalog.insert_song(&song("Lithium")).await.unwrap();

        let update = SongUpdate {
            artist: Some("Nirvana".to_string()),
            year: Some(1991),
            ..Default::default()
        };
        catalog.update_song(id, &update).await.unwrap();

        let loaded = catalog.get_song_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Lithium"));
        assert_eq!(loaded.artist.as_deref(), Some("Nirvana"));
        assert_eq!(loaded.album.as_deref(), Some("Nevermind"));
        assert_eq!(loaded.year, Some(1991));
    }

    #[tokio::test]
    async fn test_update_missing_song_is_not_found() {
        let catalog = setup_test_catalog().await;
        let result = catalog.update_song(99, &SongUpdate::default()).await;
        assert!(matches!(result, Err(CatalogStoreError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_get_all_in_id_order_and_delete() {
        let catalog = setup_test_catalog().await;
        let a = catalog.insert_song(&song("A")).await.unwrap();
        let b = catalog.insert_song(&song("B")).await.unwrap();

        let all = catalog.get_all_songs().await.unwrap();
        assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a, b]);

        catalog.delete_song(a).await.unwrap();
        assert!(catalog.get_song_by_id(a).await.unwrap().is_none());
        assert_eq!(catalog.get_all_songs().await.unwrap().len(), 1);
    }
}

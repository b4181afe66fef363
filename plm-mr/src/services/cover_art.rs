//! Album cover art retrieval with an on-disk cache
//!
//! Cache hit → cached file. Otherwise the release is found on MusicBrainz
//! (unless the caller already knows it) and the front image is fetched
//! from the Cover Art Archive.

use crate::services::catalog_sources::USER_AGENT;
use crate::services::file_organizer::sanitize_component;
use crate::utils::RateLimiter;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const MUSICBRAINZ_RELEASE_URL: &str = "https://musicbrainz.org/ws/2/release";
const COVER_ART_ARCHIVE_URL: &str = "https://coverartarchive.org/release";
const RATE_LIMIT_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait CoverArtProvider: Send + Sync {
    /// Path of the cached cover for an album, fetching it when missing
    ///
    /// `Ok(None)` when no cover exists. `release_hint` is a release MBID
    /// already known from resolution.
    async fn ensure_cover(
        &self,
        artist: &str,
        album: &str,
        release_hint: Option<&str>,
    ) -> Result<Option<PathBuf>, CoverArtError>;
}

/// `"<Artist> - <Album>.jpg"` inside the cache directory
pub fn cover_cache_path(cache_dir: &Path, artist: &str, album: &str) -> PathBuf {
    cache_dir.join(format!(
        "{} - {}.jpg",
        sanitize_component(artist),
        sanitize_component(album)
    ))
}

#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<ReleaseSummary>,
}

#[derive(Debug, Deserialize)]
struct ReleaseSummary {
    id: String,
}

pub struct CoverArtClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    cache_dir: PathBuf,
}

impl CoverArtClient {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CoverArtError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CoverArtError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            cache_dir: cache_dir.into(),
        })
    }

    async fn find_release_id(&self, artist: &str, album: &str) -> Result<Option<String>, CoverArtError> {
        self.rate_limiter.wait().await;

        let query = format!(
            "release:\"{}\" AND artist:\"{}\"",
            album.replace('"', ""),
            artist.replace('"', "")
        );
        tracing::debug!(query = %query, "Searching MusicBrainz release for cover art");

        let response = self
            .http_client
            .get(MUSICBRAINZ_RELEASE_URL)
            .query(&[("query", query.as_str()), ("limit", "1"), ("fmt", "json")])
            .send()
            .await
            .map_err(|e| CoverArtError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CoverArtError::ApiError(status.as_u16(), error_text));
        }

        let search: ReleaseSearchResponse = response
            .json()
            .await
            .map_err(|e| CoverArtError::ParseError(e.to_string()))?;

        Ok(search.releases.into_iter().next().map(|r| r.id))
    }

    async fn download_front(&self, release_id: &str) -> Result<Option<Vec<u8>>, CoverArtError> {
        let url = format!("{}/{}/front-500", COVER_ART_ARCHIVE_URL, release_id);
        tracing::debug!(release_id = %release_id, url = %url, "Fetching cover art");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoverArtError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CoverArtError::ApiError(status.as_u16(), error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoverArtError::NetworkError(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

#[async_trait]
impl CoverArtProvider for CoverArtClient {
    async fn ensure_cover(
        &self,
        artist: &str,
        album: &str,
        release_hint: Option<&str>,
    ) -> Result<Option<PathBuf>, CoverArtError> {
        if artist.trim().is_empty() || album.trim().is_empty() {
            return Ok(None);
        }

        let cache_path = cover_cache_path(&self.cache_dir, artist, album);
        if cache_path.exists() {
            tracing::debug!(path = %cache_path.display(), "Cover art cache hit");
            return Ok(Some(cache_path));
        }

        let release_id = match release_hint {
            Some(id) => Some(id.to_string()),
            None => self.find_release_id(artist, album).await?,
        };
        let Some(release_id) = release_id else {
            tracing::debug!(artist = %artist, album = %album, "No release found for cover art");
            return Ok(None);
        };

        let Some(image) = self.download_front(&release_id).await? else {
            tracing::debug!(release_id = %release_id, "Release has no front cover");
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&cache_path, image).await?;

        tracing::info!(
            artist = %artist,
            album = %album,
            path = %cache_path.display(),
            "Cover art cached"
        );
        Ok(Some(cache_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_path_is_sanitized() {
        assert_eq!(
            cover_cache_path(Path::new("/covers"), "AC/DC", "Back in Black"),
            PathBuf::from("/covers/AC_DC - Back in Black.jpg")
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cover_cache_path(dir.path(), "Nirvana", "Nevermind");
        std::fs::write(&cached, b"jpeg").unwrap();

        let client = CoverArtClient::new(dir.path()).unwrap();
        let path = client.ensure_cover("Nirvana", "Nevermind", None).await.unwrap();
        assert_eq!(path, Some(cached));
    }

    #[tokio::test]
    async fn test_unknown_album_has_no_cover() {
        let dir = tempfile::tempdir().unwrap();
        let client = CoverArtClient::new(dir.path()).unwrap();
        assert_eq!(client.ensure_cover("Nirvana", "", None).await.unwrap(), None);
    }
}

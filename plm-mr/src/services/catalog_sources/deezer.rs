//! Deezer search adapter
//!
//! Deezer reports quota and query errors inside a 200 response as an
//! `error` object.

use super::{
    build_http_client, fetch_json, non_empty, CatalogError, CatalogSource, RawCandidate,
    SearchQuery,
};
use crate::models::CandidateSource;
use crate::utils::RateLimiter;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const DEEZER_SEARCH_URL: &str = "https://api.deezer.com/search";
// 50 requests per 5 seconds
const RATE_LIMIT_MS: u64 = 100;
/// Deezer's "quota exceeded" error code
const QUOTA_ERROR_CODE: u16 = 4;

#[derive(Debug, Deserialize)]
struct DeezerResponse {
    #[serde(default)]
    data: Vec<DeezerTrack>,
    error: Option<DeezerError>,
}

#[derive(Debug, Deserialize)]
struct DeezerError {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: u16,
}

#[derive(Debug, Deserialize)]
struct DeezerTrack {
    title: String,
    /// Seconds
    duration: Option<u32>,
    artist: Option<DeezerArtist>,
    album: Option<DeezerAlbum>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeezerAlbum {
    title: String,
}

/// Deezer advanced search syntax: `artist:"x" track:"y"`
fn build_query(query: &SearchQuery) -> String {
    let mut parts = Vec::new();
    if !query.artist.is_empty() {
        parts.push(format!("artist:\"{}\"", query.artist.replace('"', "")));
    }
    if !query.title.is_empty() {
        parts.push(format!("track:\"{}\"", query.title.replace('"', "")));
    }
    parts.join(" ")
}

fn normalize(response: DeezerResponse) -> Result<Vec<RawCandidate>, CatalogError> {
    if let Some(error) = response.error {
        if error.code == QUOTA_ERROR_CODE {
            return Err(CatalogError::RateLimitExceeded);
        }
        return Err(CatalogError::ApiError(
            error.code,
            format!("{}: {}", error.error_type, error.message),
        ));
    }

    Ok(response
        .data
        .into_iter()
        .map(|track| RawCandidate {
            title: track.title,
            artist: track.artist.map(|a| a.name).unwrap_or_default(),
            album: non_empty(track.album.map(|a| a.title)),
            // Search results carry no release date
            year: None,
            duration: track.duration.map(f64::from),
            recording_id: None,
            release_id: None,
        })
        .collect())
}

/// Deezer catalog adapter
pub struct DeezerSource {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl DeezerSource {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            http_client: build_http_client()?,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }
}

#[async_trait]
impl CatalogSource for DeezerSource {
    fn source(&self) -> CandidateSource {
        CandidateSource::Deezer
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, CatalogError> {
        self.rate_limiter.wait().await;

        let q = build_query(query);
        let limit = limit.to_string();
        tracing::debug!(query = %q, "Querying Deezer search");

        let request = self
            .http_client
            .get(DEEZER_SEARCH_URL)
            .query(&[("q", q.as_str()), ("limit", limit.as_str())]);
        let response: DeezerResponse = fetch_json(request).await?;

        normalize(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tracks() {
        let json = r#"{
            "data": [
                {
                    "id": 13791930,
                    "title": "Lithium",
                    "duration": 257,
                    "artist": {"id": 415, "name": "Nirvana"},
                    "album": {"id": 1262014, "title": "Nevermind"}
                },
                {"id": 1, "title": "Lithium (Live)"}
            ],
            "total": 2
        }"#;
        let response: DeezerResponse = serde_json::from_str(json).unwrap();
        let candidates = normalize(response).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].artist, "Nirvana");
        assert_eq!(candidates[0].album.as_deref(), Some("Nevermind"));
        assert_eq!(candidates[0].duration, Some(257.0));
        assert_eq!(candidates[1].artist, "");
        assert_eq!(candidates[1].album, None);
    }

    #[test]
    fn test_embedded_error_is_reported() {
        let json = r#"{"error": {"type": "Exception", "message": "Quota limit exceeded", "code": 4}}"#;
        let response: DeezerResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(normalize(response), Err(CatalogError::RateLimitExceeded)));

        let json = r#"{"error": {"type": "DataException", "message": "no data", "code": 800}}"#;
        let response: DeezerResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(normalize(response), Err(CatalogError::ApiError(800, _))));
    }

    #[test]
    fn test_build_query() {
        let query = SearchQuery::new("Lithium", "Nirvana", None);
        assert_eq!(build_query(&query), r#"artist:"Nirvana" track:"Lithium""#);
    }
}

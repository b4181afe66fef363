//! MusicBrainz recording search
//!
//! Rate limited to 1 request/second as required by the MusicBrainz API.

use super::{
    build_http_client, fetch_json, non_empty, parse_year, CatalogError, CatalogSource,
    RawCandidate, SearchQuery,
};
use crate::models::CandidateSource;
use crate::utils::RateLimiter;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const RATE_LIMIT_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct MBSearchResponse {
    #[serde(default)]
    recordings: Vec<MBRecording>,
}

#[derive(Debug, Deserialize)]
struct MBRecording {
    id: String,
    title: String,
    /// Milliseconds
    length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MBArtistCredit>,
    #[serde(default)]
    releases: Vec<MBRelease>,
}

#[derive(Debug, Deserialize)]
struct MBArtistCredit {
    name: String,
    #[serde(default)]
    joinphrase: String,
}

#[derive(Debug, Deserialize)]
struct MBRelease {
    id: String,
    title: String,
    date: Option<String>,
}

/// Escape Lucene special characters inside a quoted phrase
fn escape_phrase(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Lucene query for the recording search endpoint
fn build_query(query: &SearchQuery) -> String {
    let mut parts = Vec::new();
    if !query.title.is_empty() {
        parts.push(format!("recording:\"{}\"", escape_phrase(&query.title)));
    }
    if !query.artist.is_empty() {
        parts.push(format!("artist:\"{}\"", escape_phrase(&query.artist)));
    }
    parts.join(" AND ")
}

/// Canonical shape: credits joined with their join phrases, first release
fn normalize(response: MBSearchResponse) -> Vec<RawCandidate> {
    response
        .recordings
        .into_iter()
        .map(|recording| {
            let artist: String = recording
                .artist_credit
                .iter()
                .map(|credit| format!("{}{}", credit.name, credit.joinphrase))
                .collect();
            let release = recording.releases.into_iter().next();

            RawCandidate {
                title: recording.title,
                artist: artist.trim().to_string(),
                album: non_empty(release.as_ref().map(|r| r.title.clone())),
                year: release
                    .as_ref()
                    .and_then(|r| r.date.as_deref())
                    .and_then(parse_year),
                duration: recording.length.map(|ms| ms as f64 / 1000.0),
                recording_id: Some(recording.id),
                release_id: release.map(|r| r.id),
            }
        })
        .collect()
}

/// MusicBrainz catalog adapter
pub struct MusicBrainzSource {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl MusicBrainzSource {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            http_client: build_http_client()?,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }
}

#[async_trait]
impl CatalogSource for MusicBrainzSource {
    fn source(&self) -> CandidateSource {
        CandidateSource::MusicBrainz
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, CatalogError> {
        self.rate_limiter.wait().await;

        let lucene = build_query(query);
        let limit = limit.to_string();
        let url = format!("{}/recording", MUSICBRAINZ_BASE_URL);
        tracing::debug!(query = %lucene, "Querying MusicBrainz recording search");

        let request = self.http_client.get(&url).query(&[
            ("query", lucene.as_str()),
            ("limit", limit.as_str()),
            ("fmt", "json"),
        ]);
        let response: MBSearchResponse = fetch_json(request).await?;

        Ok(normalize(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "created": "2024-01-01T00:00:00.000Z",
        "count": 2,
        "recordings": [
            {
                "id": "rec-1",
                "score": 100,
                "title": "Smells Like Teen Spirit",
                "length": 301920,
                "artist-credit": [{"name": "Nirvana", "artist": {"id": "a-1", "name": "Nirvana"}}],
                "releases": [
                    {"id": "rel-1", "title": "Nevermind", "date": "1991-09-24"},
                    {"id": "rel-2", "title": "Nirvana", "date": "2002-10-29"}
                ]
            },
            {
                "id": "rec-2",
                "title": "Under Pressure",
                "artist-credit": [
                    {"name": "Queen", "joinphrase": " & "},
                    {"name": "David Bowie"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_normalize_recordings() {
        let response: MBSearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let candidates = normalize(response);
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title, "Smells Like Teen Spirit");
        assert_eq!(first.artist, "Nirvana");
        assert_eq!(first.album.as_deref(), Some("Nevermind"));
        assert_eq!(first.year, Some(1991));
        assert_eq!(first.duration, Some(301.92));
        assert_eq!(first.recording_id.as_deref(), Some("rec-1"));
        assert_eq!(first.release_id.as_deref(), Some("rel-1"));

        let second = &candidates[1];
        assert_eq!(second.artist, "Queen & David Bowie");
        assert_eq!(second.album, None);
        assert_eq!(second.duration, None);
    }

    #[test]
    fn test_empty_response() {
        let response: MBSearchResponse = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(normalize(response).is_empty());
    }

    #[test]
    fn test_build_query_escapes_quotes() {
        let query = SearchQuery::new("Say \"Hi\"", "Nirvana", None);
        assert_eq!(
            build_query(&query),
            r#"recording:"Say \"Hi\"" AND artist:"Nirvana""#
        );
        let title_only = SearchQuery::new("Lithium", "", None);
        assert_eq!(build_query(&title_only), r#"recording:"Lithium""#);
    }
}

//! iTunes Search API adapter

use super::{
    build_http_client, fetch_json, non_empty, parse_year, CatalogError, CatalogSource,
    RawCandidate, SearchQuery,
};
use crate::models::CandidateSource;
use crate::utils::RateLimiter;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";
// Apple documents roughly 20 calls per minute
const RATE_LIMIT_MS: u64 = 3000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ITunesResponse {
    #[serde(default)]
    results: Vec<ITunesTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ITunesTrack {
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    track_time_millis: Option<u64>,
    release_date: Option<String>,
}

fn normalize(response: ITunesResponse) -> Vec<RawCandidate> {
    response
        .results
        .into_iter()
        .filter_map(|track| {
            // Non-song results (videos, podcasts) may lack a track name
            let title = non_empty(track.track_name)?;
            Some(RawCandidate {
                title,
                artist: track.artist_name.unwrap_or_default(),
                album: non_empty(track.collection_name),
                year: track.release_date.as_deref().and_then(parse_year),
                duration: track.track_time_millis.map(|ms| ms as f64 / 1000.0),
                recording_id: None,
                release_id: None,
            })
        })
        .collect()
}

/// iTunes catalog adapter
pub struct ITunesSource {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl ITunesSource {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            http_client: build_http_client()?,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }
}

#[async_trait]
impl CatalogSource for ITunesSource {
    fn source(&self) -> CandidateSource {
        CandidateSource::ITunes
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, CatalogError> {
        self.rate_limiter.wait().await;

        let term = query.free_text();
        let limit = limit.to_string();
        tracing::debug!(term = %term, "Querying iTunes search");

        let request = self.http_client.get(ITUNES_SEARCH_URL).query(&[
            ("term", term.as_str()),
            ("media", "music"),
            ("entity", "song"),
            ("limit", limit.as_str()),
        ]);
        let response: ITunesResponse = fetch_json(request).await?;

        Ok(normalize(response))
    }
}

//! External metadata catalogs
//!
//! Each adapter parses its native response shape privately and hands back
//! [`RawCandidate`]s. Scoring happens in the resolver.

pub mod deezer;
pub mod itunes;
pub mod musicbrainz;

pub use deezer::DeezerSource;
pub use itunes::ITunesSource;
pub use musicbrainz::MusicBrainzSource;

use crate::models::CandidateSource;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const USER_AGENT: &str = concat!(
    "PLM/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/plm/plm)"
);

const HTTP_TIMEOUT_SECS: u64 = 30;

/// Catalog search errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Cleaned search terms
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub title: String,
    /// Empty when the artist is unknown
    pub artist: String,
    /// Seconds
    pub duration: Option<f64>,
}

impl SearchQuery {
    pub fn new(title: &str, artist: &str, duration: Option<f64>) -> Self {
        Self {
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
            duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.artist.is_empty()
    }

    /// Free-text form: `"artist title"`
    pub fn free_text(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (true, _) => self.title.clone(),
            (false, true) => self.artist.clone(),
            (false, false) => format!("{} {}", self.artist, self.title),
        }
    }
}

/// Catalog result in canonical shape, before scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Seconds
    pub duration: Option<f64>,
    pub recording_id: Option<String>,
    pub release_id: Option<String>,
}

/// One external catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source(&self) -> CandidateSource;

    /// Search for recordings; one attempt, no retry
    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, CatalogError>;
}

/// HTTP client shared by all adapters' construction
pub(crate) fn build_http_client() -> Result<reqwest::Client, CatalogError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| CatalogError::NetworkError(e.to_string()))
}

/// Send a request and decode a JSON body, mapping HTTP failures
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CatalogError> {
    let response = request
        .send()
        .await
        .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

    let status = response.status();

    if status == 429 || status == 503 {
        return Err(CatalogError::RateLimitExceeded);
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| CatalogError::ParseError(e.to_string()))
}

/// Year from an ISO-like date (`"1991"`, `"1991-09-10"`, `"1991-09-10T07:00:00Z"`)
pub fn parse_year(date: &str) -> Option<i32> {
    let year = date.trim().get(0..4)?;
    year.parse().ok().filter(|y| *y > 0)
}

/// Drop blank strings
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the adapters for the enabled catalogs, in configured order
pub fn build_sources(
    catalogs: &[CandidateSource],
) -> Result<Vec<Arc<dyn CatalogSource>>, CatalogError> {
    let mut sources: Vec<Arc<dyn CatalogSource>> = Vec::new();
    for catalog in catalogs {
        match catalog {
            CandidateSource::MusicBrainz => sources.push(Arc::new(MusicBrainzSource::new()?)),
            CandidateSource::ITunes => sources.push(Arc::new(ITunesSource::new()?)),
            CandidateSource::Deezer => sources.push(Arc::new(DeezerSource::new()?)),
            CandidateSource::FallbackFingerprint => {
                tracing::warn!("Fingerprint fallback is not a searchable catalog, skipping");
            }
        }
    }
    Ok(sources)
}

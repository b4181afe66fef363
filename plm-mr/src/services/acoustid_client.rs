//! AcoustID API client
//!
//! Fingerprint lookup returning MusicBrainz recordings with their releases.
//! Rate limited to 3 requests/second.

use crate::utils::RateLimiter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const ACOUSTID_BASE_URL: &str = "https://api.acoustid.org/v2/lookup";
const RATE_LIMIT_MS: u64 = 334;
/// AcoustID error code for a rejected client key
const INVALID_KEY_CODE: i64 = 4;

/// AcoustID client errors
#[derive(Debug, Error)]
pub enum AcoustIDError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("No matches found for fingerprint")]
    NoMatches,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<AcoustIDResult>,
    pub error: Option<AcoustIDErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDResult {
    /// AcoustID track id
    pub id: String,
    /// Match confidence, 0.0–1.0
    pub score: f64,
    pub recordings: Option<Vec<AcoustIDRecording>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDRecording {
    /// MusicBrainz recording MBID
    pub id: String,
    pub title: Option<String>,
    pub artists: Option<Vec<AcoustIDArtist>>,
    /// Seconds
    pub duration: Option<f64>,
    pub releases: Option<Vec<AcoustIDRelease>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDArtist {
    pub id: String,
    pub name: String,
    pub joinphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDRelease {
    pub id: String,
    pub title: Option<String>,
    pub date: Option<AcoustIDDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcoustIDDate {
    pub year: Option<i32>,
}

/// Best identified recording
#[derive(Debug, Clone, PartialEq)]
pub struct AcoustIDMatch {
    /// 0.0–1.0
    pub score: f64,
    pub recording_id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub release_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// AcoustID API client
pub struct AcoustIDClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    api_key: String,
}

impl AcoustIDClient {
    pub fn new(api_key: String) -> Result<Self, AcoustIDError> {
        let http_client = reqwest::Client::builder()
            .user_agent(crate::services::catalog_sources::USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AcoustIDError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            api_key,
        })
    }

    /// Lookup recordings by Chromaprint fingerprint
    pub async fn lookup(
        &self,
        fingerprint: &str,
        duration_seconds: u64,
    ) -> Result<AcoustIDResponse, AcoustIDError> {
        self.rate_limiter.wait().await;

        let duration = duration_seconds.to_string();
        let params = [
            ("client", self.api_key.as_str()),
            ("meta", "recordings releases"),
            ("duration", duration.as_str()),
            ("fingerprint", fingerprint),
        ];

        tracing::debug!(duration_seconds = duration_seconds, "Querying AcoustID API");

        let response = self
            .http_client
            .post(ACOUSTID_BASE_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AcoustIDError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(AcoustIDError::InvalidApiKey);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error_body(status.as_u16(), &error_text));
        }

        let acoustid_response: AcoustIDResponse = response
            .json()
            .await
            .map_err(|e| AcoustIDError::ParseError(e.to_string()))?;

        if acoustid_response.results.is_empty() {
            return Err(AcoustIDError::NoMatches);
        }

        if let Some(top_result) = acoustid_response.results.first() {
            tracing::info!(
                acoustid = %top_result.id,
                score = top_result.score,
                recordings = top_result.recordings.as_ref().map(|r| r.len()).unwrap_or(0),
                "AcoustID lookup successful"
            );
        }

        Ok(acoustid_response)
    }

    /// Highest-scoring result that carries a titled recording
    pub fn best_match(response: &AcoustIDResponse) -> Option<AcoustIDMatch> {
        let mut results: Vec<&AcoustIDResult> = response.results.iter().collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results.into_iter().find_map(|result| {
            let recording = result
                .recordings
                .as_ref()?
                .iter()
                .find(|r| r.title.as_deref().is_some_and(|t| !t.trim().is_empty()))?;
            Some(to_match(result.score, recording))
        })
    }
}

fn to_match(score: f64, recording: &AcoustIDRecording) -> AcoustIDMatch {
    let artist: String = recording
        .artists
        .iter()
        .flatten()
        .map(|a| format!("{}{}", a.name, a.joinphrase.as_deref().unwrap_or("")))
        .collect();
    let release = recording.releases.as_ref().and_then(|r| r.first());

    AcoustIDMatch {
        score,
        recording_id: recording.id.clone(),
        title: recording.title.clone().unwrap_or_default(),
        artist: artist.trim().to_string(),
        album: release.and_then(|r| r.title.clone()),
        release_id: release.map(|r| r.id.clone()),
        year: release.and_then(|r| r.date.as_ref()).and_then(|d| d.year),
        duration: recording.duration,
    }
}

/// AcoustID reports a bad key as HTTP 400 with error code 4
fn classify_error_body(status: u16, body: &str) -> AcoustIDError {
    match serde_json::from_str::<AcoustIDResponse>(body) {
        Ok(AcoustIDResponse {
            error: Some(error), ..
        }) if error.code == INVALID_KEY_CODE => AcoustIDError::InvalidApiKey,
        Ok(AcoustIDResponse {
            error: Some(error), ..
        }) => AcoustIDError::ApiError(status, error.message),
        _ => AcoustIDError::ApiError(status, body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "ok",
        "results": [
            {"id": "low", "score": 0.41, "recordings": [{"id": "rec-x", "title": "Other"}]},
            {
                "id": "high",
                "score": 0.97,
                "recordings": [
                    {"id": "rec-untitled"},
                    {
                        "id": "rec-1",
                        "title": "Smells Like Teen Spirit",
                        "duration": 301.0,
                        "artists": [{"id": "a-1", "name": "Nirvana"}],
                        "releases": [
                            {"id": "rel-1", "title": "Nevermind", "date": {"year": 1991, "month": 9}}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_best_match_picks_highest_titled_recording() {
        let response: AcoustIDResponse = serde_json::from_str(SAMPLE).unwrap();
        let best = AcoustIDClient::best_match(&response).unwrap();
        assert_eq!(best.score, 0.97);
        assert_eq!(best.recording_id, "rec-1");
        assert_eq!(best.title, "Smells Like Teen Spirit");
        assert_eq!(best.artist, "Nirvana");
        assert_eq!(best.album.as_deref(), Some("Nevermind"));
        assert_eq!(best.release_id.as_deref(), Some("rel-1"));
        assert_eq!(best.year, Some(1991));
        assert_eq!(best.duration, Some(301.0));
    }

    #[test]
    fn test_best_match_without_recordings() {
        let response: AcoustIDResponse =
            serde_json::from_str(r#"{"status": "ok", "results": [{"id": "x", "score": 0.9}]}"#)
                .unwrap();
        assert!(AcoustIDClient::best_match(&response).is_none());
    }

    #[test]
    fn test_invalid_key_error_body() {
        let body = r#"{"status": "error", "error": {"code": 4, "message": "invalid API key"}}"#;
        assert!(matches!(classify_error_body(400, body), AcoustIDError::InvalidApiKey));

        let body = r#"{"status": "error", "error": {"code": 3, "message": "invalid fingerprint"}}"#;
        assert!(matches!(
            classify_error_body(400, body),
            AcoustIDError::ApiError(400, ref m) if m == "invalid fingerprint"
        ));

        assert!(matches!(
            classify_error_body(502, "bad gateway"),
            AcoustIDError::ApiError(502, _)
        ));
    }

    #[test]
    fn test_client_creation() {
        assert!(AcoustIDClient::new("key".to_string()).is_ok());
    }
}

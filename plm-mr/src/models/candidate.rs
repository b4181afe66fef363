//! Match candidates produced by catalogs and the fingerprint fallback

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which catalog (or the fallback identifier) produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    #[serde(rename = "musicbrainz")]
    MusicBrainz,
    #[serde(rename = "itunes")]
    ITunes,
    #[serde(rename = "deezer")]
    Deezer,
    #[serde(rename = "fallback-fingerprint")]
    FallbackFingerprint,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::MusicBrainz => "musicbrainz",
            CandidateSource::ITunes => "itunes",
            CandidateSource::Deezer => "deezer",
            CandidateSource::FallbackFingerprint => "fallback-fingerprint",
        }
    }

    /// Parse a catalog name as used in configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "musicbrainz" => Some(CandidateSource::MusicBrainz),
            "itunes" => Some(CandidateSource::ITunes),
            "deezer" => Some(CandidateSource::Deezer),
            "fallback-fingerprint" => Some(CandidateSource::FallbackFingerprint),
            _ => None,
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored metadata match
///
/// Candidates returned by one resolution call are sorted by `score`,
/// highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Confidence, 0–100
    pub score: f64,
    pub source: CandidateSource,
    /// MusicBrainz recording MBID when the source knows it
    pub recording_id: Option<String>,
    /// MusicBrainz release MBID when the source knows it
    pub release_id: Option<String>,
}

/// Sort candidates by descending score (stable for ties)
pub fn sort_by_score(candidates: &mut [MatchCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

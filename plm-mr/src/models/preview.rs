//! Preview entries: proposed corrections awaiting human approval

use crate::models::{CandidateSource, CorruptionLevel, IssueTag, SongId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Confidence assigned to entries that were never externally corroborated
pub const CLEANED_ONLY_CONFIDENCE: f64 = 50.0;

/// Source label for cleaned-only entries
pub const CLEANED_SOURCE: &str = "cleaned";

/// Whether the proposal came from a resolved match or only from cleaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Fetched,
    CleanedOnly,
}

/// What happened when resolution was (or was not) attempted for a song
///
/// Lets the reviewer tell "not attempted", "attempted but low confidence"
/// and "attempted and failed" apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Resolve stage disabled or run cancelled before this song
    NotAttempted,
    /// A catalog match met the confidence threshold
    Matched,
    /// Fingerprint fallback produced the match
    FallbackMatched,
    /// Sources answered but nothing met the threshold
    LowConfidence,
    /// Every source failed for this song
    SourcesUnreachable,
}

impl ResolutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionOutcome::NotAttempted => "not_attempted",
            ResolutionOutcome::Matched => "matched",
            ResolutionOutcome::FallbackMatched => "fallback_matched",
            ResolutionOutcome::LowConfidence => "low_confidence",
            ResolutionOutcome::SourcesUnreachable => "sources_unreachable",
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values currently in the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginalMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
}

/// Values the pipeline proposes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<i32>,
}

/// Unit of human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub song_id: SongId,
    pub original: OriginalMetadata,
    pub proposed: ProposedMetadata,
    /// 0–100
    pub confidence: f64,
    /// Catalog name, `fallback-fingerprint`, or `cleaned`
    pub source: String,
    pub status: PreviewStatus,
    pub resolution: ResolutionOutcome,
    pub corruption_level: CorruptionLevel,
    /// Issues found while cleaning, per field
    #[serde(default)]
    pub issues: BTreeMap<String, Vec<IssueTag>>,
    /// Release MBID of the match, used for cover art
    #[serde(default)]
    pub release_id: Option<String>,
}

impl PreviewEntry {
    /// True when the proposal differs from what the catalog holds
    pub fn has_changes(&self) -> bool {
        self.original.title != self.proposed.title
            || self.original.artist != self.proposed.artist
            || self.original.album != self.proposed.album
            || self.proposed.year.is_some()
    }

    pub fn is_from(&self, source: CandidateSource) -> bool {
        self.source == source.as_str()
    }
}

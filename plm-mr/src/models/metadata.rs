//! Cleaned metadata and the issue tags that explain each change

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field names used as keys of [`CleanedMetadata::issues`]
pub const FIELD_TITLE: &str = "title";
pub const FIELD_ARTIST: &str = "artist";
pub const FIELD_ALBUM: &str = "album";

/// Sentinel used when no usable title remains
pub const UNKNOWN_TITLE: &str = "Unknown";
/// Sentinel used when no usable artist remains
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Albums are optional; a missing album is stored as empty
pub const UNKNOWN_ALBUM: &str = "";

/// One detected problem in a metadata field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTag {
    /// `_YYYYMMDD_HHMMSS` download timestamp
    TimestampSuffix,
    /// Leading `"00 - 00 - "` style prefix
    RepeatedTrackNumbers,
    /// Leading placeholder phrase such as `"Unknown Artist - "`
    PlaceholderPrefix,
    /// Bracketed platform artifact such as `"[Official Video]"`
    PlatformArtifact,
    /// Runs of whitespace collapsed
    ExtraWhitespace,
    /// Dangling `-` at the end
    TrailingDash,
    MissingTitle,
    MissingArtist,
    MissingAlbum,
    /// Artist recovered from an `"Artist - Title"` title
    ArtistFromTitle,
}

impl IssueTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueTag::TimestampSuffix => "timestamp_suffix",
            IssueTag::RepeatedTrackNumbers => "repeated_track_numbers",
            IssueTag::PlaceholderPrefix => "placeholder_prefix",
            IssueTag::PlatformArtifact => "platform_artifact",
            IssueTag::ExtraWhitespace => "extra_whitespace",
            IssueTag::TrailingDash => "trailing_dash",
            IssueTag::MissingTitle => "missing_title",
            IssueTag::MissingArtist => "missing_artist",
            IssueTag::MissingAlbum => "missing_album",
            IssueTag::ArtistFromTitle => "artist_from_title",
        }
    }
}

impl fmt::Display for IssueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized title/artist/album derived from a catalog record
///
/// Deterministic for a given record; never persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Field name → issues found in that field
    pub issues: BTreeMap<String, Vec<IssueTag>>,
}

impl CleanedMetadata {
    /// Record the issues of one field; empty lists are not stored
    pub fn set_issues(&mut self, field: &str, issues: Vec<IssueTag>) {
        if issues.is_empty() {
            self.issues.remove(field);
        } else {
            self.issues.insert(field.to_string(), issues);
        }
    }

    /// Append an issue to a field
    pub fn push_issue(&mut self, field: &str, issue: IssueTag) {
        self.issues.entry(field.to_string()).or_default().push(issue);
    }

    pub fn has_issue(&self, field: &str, issue: IssueTag) -> bool {
        self.issues
            .get(field)
            .map(|list| list.contains(&issue))
            .unwrap_or(false)
    }

    /// Artist usable as a search term (sentinel → empty)
    pub fn query_artist(&self) -> &str {
        if self.artist == UNKNOWN_ARTIST {
            ""
        } else {
            &self.artist
        }
    }

    /// Title usable as a search term (sentinel → empty)
    pub fn query_title(&self) -> &str {
        if self.title == UNKNOWN_TITLE {
            ""
        } else {
            &self.title
        }
    }
}

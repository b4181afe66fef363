//! Corruption detection and metadata normalization
//!
//! Pure functions; no I/O. Missing fields are treated as empty.
//!
//! Severity weights:
//!
//! | Issue | Weight |
//! |---|---|
//! | timestamp in title / artist / album | 2 / 2 / 1 |
//! | repeated track-number prefix in title | 1 |
//! | missing or placeholder artist | 2 |
//! | missing or placeholder album | 1 |
//! | platform artifact in title | 1 |
//! | placeholder prefix in title | 2 |

use crate::models::{
    CleanedMetadata, CorruptionLevel, CorruptionReport, IssueTag, SongCorruption, SongRecord,
    FIELD_ALBUM, FIELD_ARTIST, FIELD_TITLE, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

const WEIGHT_TIMESTAMP_TITLE: u32 = 2;
const WEIGHT_TIMESTAMP_ARTIST: u32 = 2;
const WEIGHT_TIMESTAMP_ALBUM: u32 = 1;
const WEIGHT_REPEATED_TRACK: u32 = 1;
const WEIGHT_MISSING_ARTIST: u32 = 2;
const WEIGHT_MISSING_ALBUM: u32 = 1;
const WEIGHT_PLATFORM_ARTIFACT: u32 = 1;
const WEIGHT_PLACEHOLDER_PREFIX: u32 = 2;

/// Download timestamp: `_20240101_120000`
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\d{8}_\d{6}").unwrap());

/// Two or more leading track-number groups: `"00 - 00 - "`
///
/// The dash must be spaced so hyphenated titles like `"5-4-3-2-1"` survive.
static REPEATED_TRACK_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d{1,3}\s+-\s+){2,}").unwrap());

/// Placeholder phrase used as a prefix: `"Unknown Artist - "`
static PLACEHOLDER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:unknown\s+artist|unknown|untitled|various\s+artists)\s*-\s*").unwrap()
});

/// Bracketed platform artifacts: `[Official Video]`, `(Live)`, `(HD)`
static PLATFORM_ARTIFACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*[\[(](?:official\s+(?:music\s+|lyric\s+)?video|official\s+audio|lyrics?(?:\s+video)?|audio|video|visuali[sz]er|hd|hq|4k|live|explicit)[\])]",
    )
    .unwrap()
});

/// Channel suffixes that leak into artist names: `"Nirvana - Topic"`, `"NirvanaVEVO"`
static ARTIST_CHANNEL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\s*-\s*topic|vevo)\s*$").unwrap());

static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

static TRAILING_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[-–—]+\s*$").unwrap());

static TRACK_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^track\s*\d+$").unwrap());

const PLACEHOLDERS: [&str; 8] = [
    "unknown",
    "unknown artist",
    "unknown album",
    "unknown title",
    "untitled",
    "<unknown>",
    "n/a",
    "null",
];

/// True when the text carries no usable value
fn is_placeholder(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered.is_empty() || PLACEHOLDERS.contains(&lowered.as_str())
}

/// Strip a pattern, recording `issue` when anything was removed
fn strip(text: String, pattern: &Regex, issue: IssueTag, issues: &mut Vec<IssueTag>) -> String {
    if pattern.is_match(&text) {
        issues.push(issue);
        pattern.replace_all(&text, "").into_owned()
    } else {
        text
    }
}

/// Collapse internal whitespace runs and trim
fn collapse_whitespace(text: String, issues: &mut Vec<IssueTag>) -> String {
    let trimmed = text.trim();
    if MULTI_WHITESPACE.is_match(trimmed) {
        issues.push(IssueTag::ExtraWhitespace);
        MULTI_WHITESPACE.replace_all(trimmed, " ").into_owned()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a title
///
/// Strips timestamps, repeated track prefixes, placeholder prefixes and
/// platform artifacts, collapses whitespace and trims a trailing dash.
/// Falls back to `"Unknown"` when nothing usable remains.
pub fn clean_title(text: &str) -> (String, Vec<IssueTag>) {
    let mut issues = Vec::new();

    let mut title = strip(text.to_string(), &TIMESTAMP, IssueTag::TimestampSuffix, &mut issues);
    title = strip(title, &REPEATED_TRACK_PREFIX, IssueTag::RepeatedTrackNumbers, &mut issues);
    title = strip(title, &PLACEHOLDER_PREFIX, IssueTag::PlaceholderPrefix, &mut issues);
    title = strip(title, &PLATFORM_ARTIFACT, IssueTag::PlatformArtifact, &mut issues);
    title = collapse_whitespace(title, &mut issues);
    title = strip(title, &TRAILING_DASH, IssueTag::TrailingDash, &mut issues);

    if is_placeholder(&title) || TRACK_PLACEHOLDER.is_match(&title) {
        issues.push(IssueTag::MissingTitle);
        return (UNKNOWN_TITLE.to_string(), issues);
    }

    (title, issues)
}

/// Normalize an artist
///
/// Falls back to `"Unknown Artist"` when nothing usable remains.
pub fn clean_artist(text: &str) -> (String, Vec<IssueTag>) {
    let mut issues = Vec::new();

    let mut artist = strip(text.to_string(), &TIMESTAMP, IssueTag::TimestampSuffix, &mut issues);
    artist = strip(artist, &PLATFORM_ARTIFACT, IssueTag::PlatformArtifact, &mut issues);
    artist = strip(artist, &ARTIST_CHANNEL_SUFFIX, IssueTag::PlatformArtifact, &mut issues);
    artist = collapse_whitespace(artist, &mut issues);
    artist = strip(artist, &TRAILING_DASH, IssueTag::TrailingDash, &mut issues);

    if is_placeholder(&artist) {
        issues.push(IssueTag::MissingArtist);
        return (UNKNOWN_ARTIST.to_string(), issues);
    }

    (artist, issues)
}

/// Normalize an album
///
/// A missing or placeholder album becomes empty.
pub fn clean_album(text: &str) -> (String, Vec<IssueTag>) {
    let mut issues = Vec::new();

    let mut album = strip(text.to_string(), &TIMESTAMP, IssueTag::TimestampSuffix, &mut issues);
    album = collapse_whitespace(album, &mut issues);
    album = strip(album, &TRAILING_DASH, IssueTag::TrailingDash, &mut issues);

    if is_placeholder(&album) {
        issues.push(IssueTag::MissingAlbum);
        return (UNKNOWN_ALBUM.to_string(), issues);
    }

    (album, issues)
}

/// Clean all three fields of a record
pub fn clean_song(song: &SongRecord) -> CleanedMetadata {
    let (title, title_issues) = clean_title(song.title_str());
    let (artist, artist_issues) = clean_artist(song.artist_str());
    let (album, album_issues) = clean_album(song.album_str());

    let mut cleaned = CleanedMetadata {
        title,
        artist,
        album,
        issues: BTreeMap::new(),
    };
    cleaned.set_issues(FIELD_TITLE, title_issues);
    cleaned.set_issues(FIELD_ARTIST, artist_issues);
    cleaned.set_issues(FIELD_ALBUM, album_issues);
    cleaned
}

/// Recover the artist from an `"Artist - Title"` title
///
/// Applies only when the artist is the sentinel and the title contains
/// exactly one `" - "` with text on both sides. An explicit artist is
/// never overwritten.
pub fn split_combined_title(mut cleaned: CleanedMetadata) -> CleanedMetadata {
    if cleaned.artist != UNKNOWN_ARTIST || cleaned.title.matches(" - ").count() != 1 {
        return cleaned;
    }

    let Some((left, right)) = cleaned.title.split_once(" - ") else {
        return cleaned;
    };
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() || is_placeholder(left) {
        return cleaned;
    }

    let (artist, title) = (left.to_string(), right.to_string());
    cleaned.artist = artist;
    cleaned.title = title;
    cleaned.push_issue(FIELD_ARTIST, IssueTag::ArtistFromTitle);
    cleaned
}

/// Weighted issue count for a record
pub fn corruption_weight(song: &SongRecord) -> u32 {
    let title = song.title_str();
    let artist = song.artist_str();
    let album = song.album_str();

    let mut weight = 0;

    if TIMESTAMP.is_match(title) {
        weight += WEIGHT_TIMESTAMP_TITLE;
    }
    if TIMESTAMP.is_match(artist) {
        weight += WEIGHT_TIMESTAMP_ARTIST;
    }
    if TIMESTAMP.is_match(album) {
        weight += WEIGHT_TIMESTAMP_ALBUM;
    }
    if REPEATED_TRACK_PREFIX.is_match(title) {
        weight += WEIGHT_REPEATED_TRACK;
    }
    if is_placeholder(artist) {
        weight += WEIGHT_MISSING_ARTIST;
    }
    if is_placeholder(album) {
        weight += WEIGHT_MISSING_ALBUM;
    }
    if PLATFORM_ARTIFACT.is_match(title) {
        weight += WEIGHT_PLATFORM_ARTIFACT;
    }

    // Placeholder prefix may hide behind a track-number prefix
    let without_tracks = REPEATED_TRACK_PREFIX.replace(title, "");
    if PLACEHOLDER_PREFIX.is_match(&without_tracks) {
        weight += WEIGHT_PLACEHOLDER_PREFIX;
    }

    weight
}

/// Classify a single record
pub fn detect_corruption_level(song: &SongRecord) -> CorruptionLevel {
    CorruptionLevel::from_weight(corruption_weight(song))
}

/// Classify a batch of records
pub fn analyze_library(songs: &[SongRecord]) -> CorruptionReport {
    let mut report = CorruptionReport::default();

    for song in songs {
        let level = detect_corruption_level(song);
        let entry = SongCorruption {
            id: song.id,
            corruption_level: level,
        };
        *report.histogram.entry(level).or_insert(0) += 1;
        if level.is_flagged() {
            report.flagged.push(entry.clone());
        }
        report.songs.push(entry);
    }

    tracing::debug!(
        total = report.total(),
        flagged = report.flagged.len(),
        "Library analyzed"
    );

    report
}

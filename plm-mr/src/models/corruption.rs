//! Corruption severity and library-wide report

use crate::models::SongId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordinal severity of metadata problems for one song
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionLevel {
    Clean,
    Minor,
    Moderate,
    Severe,
}

impl CorruptionLevel {
    /// Bucket a weighted issue count
    ///
    /// 0 → clean, 1–2 → minor, 3–4 → moderate, 5+ → severe
    pub fn from_weight(weight: u32) -> Self {
        match weight {
            0 => CorruptionLevel::Clean,
            1..=2 => CorruptionLevel::Minor,
            3..=4 => CorruptionLevel::Moderate,
            _ => CorruptionLevel::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionLevel::Clean => "clean",
            CorruptionLevel::Minor => "minor",
            CorruptionLevel::Moderate => "moderate",
            CorruptionLevel::Severe => "severe",
        }
    }

    /// Moderate and severe songs are listed in the problematic-songs view
    pub fn is_flagged(&self) -> bool {
        matches!(self, CorruptionLevel::Moderate | CorruptionLevel::Severe)
    }
}

impl fmt::Display for CorruptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongCorruption {
    pub id: SongId,
    pub corruption_level: CorruptionLevel,
}

/// Library-wide corruption report
///
/// Computed fresh for each run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorruptionReport {
    /// Per-song levels, in input order
    pub songs: Vec<SongCorruption>,
    /// Count of songs per level
    pub histogram: BTreeMap<CorruptionLevel, usize>,
    /// Moderate and severe songs, in input order
    pub flagged: Vec<SongCorruption>,
}

impl CorruptionReport {
    pub fn total(&self) -> usize {
        self.songs.len()
    }

    pub fn count(&self, level: CorruptionLevel) -> usize {
        self.histogram.get(&level).copied().unwrap_or(0)
    }

    /// Level recorded for a song, if it was part of the report
    pub fn level_of(&self, id: SongId) -> Option<CorruptionLevel> {
        self.songs
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.corruption_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_weight_boundaries() {
        assert_eq!(CorruptionLevel::from_weight(0), CorruptionLevel::Clean);
        assert_eq!(CorruptionLevel::from_weight(1), CorruptionLevel::Minor);
        assert_eq!(CorruptionLevel::from_weight(2), CorruptionLevel::Minor);
        assert_eq!(CorruptionLevel::from_weight(3), CorruptionLevel::Moderate);
        assert_eq!(CorruptionLevel::from_weight(4), CorruptionLevel::Moderate);
        assert_eq!(CorruptionLevel::from_weight(5), CorruptionLevel::Severe);
        assert_eq!(CorruptionLevel::from_weight(42), CorruptionLevel::Severe);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(CorruptionLevel::Clean < CorruptionLevel::Minor);
        assert!(CorruptionLevel::Moderate < CorruptionLevel::Severe);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&CorruptionLevel::Severe).unwrap();
        assert_eq!(json, "\"severe\"");
    }
}

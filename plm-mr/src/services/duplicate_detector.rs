//! Likely-duplicate detection for human review
//!
//! Pairs are scored, never merged or deleted.

use crate::models::{SongId, SongRecord};
use crate::services::similarity::{duration_similarity, similarity};
use serde::{Deserialize, Serialize};

const TITLE_WEIGHT: f64 = 0.5;
const ARTIST_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.2;

/// Two songs that look alike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    pub a: SongId,
    pub b: SongId,
    /// 0–1
    pub score: f64,
}

/// Weighted similarity of two songs in [0, 1]
///
/// Unknown duration on either side contributes nothing.
pub fn pair_score(a: &SongRecord, b: &SongRecord) -> f64 {
    let title = similarity(a.title_str(), b.title_str());
    let artist = similarity(a.artist_str(), b.artist_str());
    let duration = match (a.duration, b.duration) {
        (Some(x), Some(y)) => duration_similarity(x, y),
        _ => 0.0,
    };

    TITLE_WEIGHT * title + ARTIST_WEIGHT * artist + DURATION_WEIGHT * duration
}

/// All pairs scoring at least `min_score`, highest first
///
/// Ties keep library order.
pub fn find_similar_songs(songs: &[SongRecord], min_score: f64) -> Vec<SimilarPair> {
    let mut pairs = Vec::new();

    for (i, a) in songs.iter().enumerate() {
        for b in &songs[i + 1..] {
            let score = pair_score(a, b);
            if score >= min_score {
                pairs.push(SimilarPair {
                    a: a.id,
                    b: b.id,
                    score,
                });
            }
        }
    }

    pairs.sort_by(|x, y| y.score.total_cmp(&x.score));
    tracing::debug!(songs = songs.len(), pairs = pairs.len(), min_score, "Similar songs found");
    pairs
}

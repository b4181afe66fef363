//! Caller-owned cache of resolution results
//!
//! Keyed by normalized `(title, artist)`. Entries never expire; the owner
//! clears the cache explicitly.

use crate::models::MatchCandidate;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    title: String,
    artist: String,
}

impl CacheKey {
    fn new(title: &str, artist: &str) -> Self {
        Self {
            title: title.trim().to_lowercase(),
            artist: artist.trim().to_lowercase(),
        }
    }
}

/// Ranked candidates per query
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: RwLock<HashMap<CacheKey, Vec<MatchCandidate>>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, title: &str, artist: &str) -> Option<Vec<MatchCandidate>> {
        self.entries
            .read()
            .await
            .get(&CacheKey::new(title, artist))
            .cloned()
    }

    pub async fn insert(&self, title: &str, artist: &str, candidates: Vec<MatchCandidate>) {
        self.entries
            .write()
            .await
            .insert(CacheKey::new(title, artist), candidates);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "Match cache cleared");
    }
}

//! Multi-source metadata resolver
//!
//! Queries every configured catalog independently, scores the normalized
//! results against the cleaned query and returns them ranked. A failing
//! catalog is logged and skipped; when every catalog fails the result is an
//! empty list.
//!
//! `score = 50·title_sim + 30·artist_sim + duration_bonus` (0–100)

use crate::models::{sort_by_score, CandidateSource, MatchCandidate, DEFAULT_MIN_CONFIDENCE};
use crate::services::catalog_sources::{CatalogSource, RawCandidate, SearchQuery};
use crate::services::match_cache::MatchCache;
use crate::services::similarity::{duration_bonus, similarity};
use std::sync::Arc;
use tracing::{debug, warn};

/// Results requested from each catalog
pub const SEARCH_LIMIT: usize = 5;

const TITLE_WEIGHT: f64 = 50.0;
const ARTIST_WEIGHT: f64 = 30.0;

/// Ranked candidates plus what happened at each catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReport {
    /// Sorted by descending score
    pub candidates: Vec<MatchCandidate>,
    pub sources_queried: usize,
    /// Catalogs that failed, with the error text
    pub failures: Vec<(CandidateSource, String)>,
    /// Served from the cache without querying
    pub from_cache: bool,
}

impl SearchReport {
    pub fn sources_failed(&self) -> usize {
        self.failures.len()
    }

    /// True when catalogs were queried and none of them answered
    pub fn all_failed(&self) -> bool {
        self.sources_queried > 0 && self.failures.len() == self.sources_queried
    }
}

/// Score one normalized result against the query
pub fn calculate_match_score(query: &SearchQuery, raw: &RawCandidate) -> f64 {
    let title_sim = similarity(&query.title, &raw.title);
    let artist_sim = similarity(&query.artist, &raw.artist);
    let bonus = duration_bonus(query.duration, raw.duration);

    (TITLE_WEIGHT * title_sim + ARTIST_WEIGHT * artist_sim + bonus).clamp(0.0, 100.0)
}

/// Top candidate iff its score meets the threshold
pub fn get_best_match(results: &[MatchCandidate], min_confidence: f64) -> Option<MatchCandidate> {
    results
        .iter()
        .max_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .filter(|best| best.score >= min_confidence)
        .cloned()
}

pub struct MetadataResolver {
    sources: Vec<Arc<dyn CatalogSource>>,
    cache: Option<Arc<MatchCache>>,
    limit: usize,
}

impl MetadataResolver {
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self {
            sources,
            cache: None,
            limit: SEARCH_LIMIT,
        }
    }

    /// Use a caller-owned cache
    pub fn with_cache(mut self, cache: Arc<MatchCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Query every catalog and report per-source failures
    pub async fn search_with_report(
        &self,
        title: &str,
        artist: &str,
        duration: Option<f64>,
    ) -> SearchReport {
        let query = SearchQuery::new(title, artist, duration);
        if query.is_empty() {
            debug!("Empty query, skipping catalog search");
            return SearchReport::default();
        }

        if let Some(cache) = &self.cache {
            if let Some(candidates) = cache.get(&query.title, &query.artist).await {
                debug!(title = %query.title, artist = %query.artist, "Match cache hit");
                return SearchReport {
                    candidates,
                    from_cache: true,
                    ..Default::default()
                };
            }
        }

        let mut report = SearchReport {
            sources_queried: self.sources.len(),
            ..Default::default()
        };

        for source in &self.sources {
            let name = source.source();
            match source.search(&query, self.limit).await {
                Ok(results) => {
                    debug!(source = %name, results = results.len(), "Catalog answered");
                    report
                        .candidates
                        .extend(results.into_iter().map(|raw| score_candidate(&query, raw, name)));
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Catalog search failed, skipping source");
                    report.failures.push((name, e.to_string()));
                }
            }
        }

        sort_by_score(&mut report.candidates);

        // Failures are not cached so a later call can retry
        if let Some(cache) = &self.cache {
            if report.failures.is_empty() {
                cache
                    .insert(&query.title, &query.artist, report.candidates.clone())
                    .await;
            }
        }

        report
    }

    /// Ranked candidates from every catalog; empty when all fail
    pub async fn search_by_title_artist(
        &self,
        title: &str,
        artist: &str,
        duration: Option<f64>,
    ) -> Vec<MatchCandidate> {
        self.search_with_report(title, artist, duration)
            .await
            .candidates
    }

    /// Search and keep the best match at or above `min_confidence`
    pub async fn fetch_metadata(
        &self,
        title: &str,
        artist: &str,
        duration: Option<f64>,
        min_confidence: f64,
    ) -> Option<MatchCandidate> {
        let results = self.search_by_title_artist(title, artist, duration).await;
        get_best_match(&results, min_confidence)
    }

    /// [`Self::fetch_metadata`] with the default threshold
    pub async fn fetch_metadata_default(
        &self,
        title: &str,
        artist: &str,
        duration: Option<f64>,
    ) -> Option<MatchCandidate> {
        self.fetch_metadata(title, artist, duration, DEFAULT_MIN_CONFIDENCE)
            .await
    }
}

fn score_candidate(query: &SearchQuery, raw: RawCandidate, source: CandidateSource) -> MatchCandidate {
    let score = calculate_match_score(query, &raw);
    MatchCandidate {
        title: raw.title,
        artist: raw.artist,
        album: raw.album,
        year: raw.year,
        duration: raw.duration,
        score,
        source,
        recording_id: raw.recording_id,
        release_id: raw.release_id,
    }
}

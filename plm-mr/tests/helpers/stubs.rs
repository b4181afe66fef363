//! Stub collaborators
//!
//! Catalog sources, identifier, tag writers and a broken catalog store,
//! each counting its calls.

use async_trait::async_trait;
use plm_mr::db::songs::{CatalogStoreError, SongCatalog};
use plm_mr::models::{CandidateSource, SongId, SongRecord, SongUpdate};
use plm_mr::services::catalog_sources::{CatalogError, CatalogSource, RawCandidate, SearchQuery};
use plm_mr::services::fallback_identifier::{FingerprintMatch, SongIdentifier};
use plm_mr::services::tag_writer::{TagUpdate, TagWriteError, TagWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Catalog that answers every query with the same results
pub struct FixedSource {
    source: CandidateSource,
    results: Vec<RawCandidate>,
    calls: AtomicUsize,
}

impl FixedSource {
    pub fn new(source: CandidateSource, results: Vec<RawCandidate>) -> Self {
        Self {
            source,
            results,
            calls: AtomicUsize::new(0),
        }
    }

    /// Single result with the given title, artist and duration
    pub fn answering(source: CandidateSource, title: &str, artist: &str, duration: Option<f64>) -> Self {
        Self::new(
            source,
            vec![RawCandidate {
                title: title.to_string(),
                artist: artist.to_string(),
                album: Some("Nevermind".to_string()),
                year: Some(1991),
                duration,
                recording_id: Some("rec-1".to_string()),
                release_id: Some("rel-1".to_string()),
            }],
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FixedSource {
    fn source(&self) -> CandidateSource {
        self.source
    }

    async fn search(&self, _query: &SearchQuery, limit: usize) -> Result<Vec<RawCandidate>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// Catalog that is always unreachable
pub struct FailingSource {
    source: CandidateSource,
}

impl FailingSource {
    pub fn new(source: CandidateSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CatalogSource for FailingSource {
    fn source(&self) -> CandidateSource {
        self.source
    }

    async fn search(&self, _query: &SearchQuery, _limit: usize) -> Result<Vec<RawCandidate>, CatalogError> {
        Err(CatalogError::NetworkError("connection refused".to_string()))
    }
}

/// Catalog that cancels the run when first queried, then answers
pub struct CancellingSource {
    inner: FixedSource,
    token: CancellationToken,
}

impl CancellingSource {
    pub fn new(inner: FixedSource, token: CancellationToken) -> Self {
        Self { inner, token }
    }
}

#[async_trait]
impl CatalogSource for CancellingSource {
    fn source(&self) -> CandidateSource {
        self.inner.source()
    }

    async fn search(&self, query: &SearchQuery, limit: usize) -> Result<Vec<RawCandidate>, CatalogError> {
        self.token.cancel();
        self.inner.search(query, limit).await
    }
}

/// Fingerprint identifier with a canned answer
pub struct StubIdentifier {
    available: bool,
    answer: Option<FingerprintMatch>,
    calls: AtomicUsize,
}

impl StubIdentifier {
    pub fn new(available: bool, answer: Option<FingerprintMatch>) -> Self {
        Self {
            available,
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    /// Available identifier matching "Lithium" by Nirvana at `score`
    pub fn matching(score: f64) -> Self {
        Self::new(
            true,
            Some(FingerprintMatch {
                title: "Lithium".to_string(),
                artist: "Nirvana".to_string(),
                album: Some("Nevermind".to_string()),
                year: Some(1991),
                score,
                recording_id: "rec-fp".to_string(),
                release_id: None,
                duration: Some(257.0),
            }),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SongIdentifier for StubIdentifier {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn identify_song(&self, _path: &Path) -> Option<FingerprintMatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Tag writer that records what it was asked to write
#[derive(Default)]
pub struct RecordingTagWriter {
    writes: Mutex<Vec<(PathBuf, TagUpdate)>>,
}

impl RecordingTagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(PathBuf, TagUpdate)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagWriter for RecordingTagWriter {
    async fn write_tags(&self, path: &Path, update: &TagUpdate) -> Result<(), TagWriteError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), update.clone()));
        Ok(())
    }
}

/// Tag writer that rejects every file
pub struct FailingTagWriter;

#[async_trait]
impl TagWriter for FailingTagWriter {
    async fn write_tags(&self, path: &Path, _update: &TagUpdate) -> Result<(), TagWriteError> {
        Err(TagWriteError::Unsupported(path.display().to_string()))
    }
}

/// Catalog store whose reads always fail
pub struct BrokenCatalog;

#[async_trait]
impl SongCatalog for BrokenCatalog {
    async fn get_all_songs(&self) -> Result<Vec<SongRecord>, CatalogStoreError> {
        Err(CatalogStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "database file unreadable",
        )))
    }

    async fn get_song_by_id(&self, _id: SongId) -> Result<Option<SongRecord>, CatalogStoreError> {
        Err(CatalogStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "database file unreadable",
        )))
    }

    async fn update_song(&self, id: SongId, _update: &SongUpdate) -> Result<(), CatalogStoreError> {
        Err(CatalogStoreError::NotFound(id))
    }

    async fn delete_song(&self, id: SongId) -> Result<(), CatalogStoreError> {
        Err(CatalogStoreError::NotFound(id))
    }
}

/// Catalog store that reads through to `inner` but rejects every write
pub struct ReadOnlyCatalog {
    inner: Arc<dyn SongCatalog>,
}

impl ReadOnlyCatalog {
    pub fn new(inner: Arc<dyn SongCatalog>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SongCatalog for ReadOnlyCatalog {
    async fn get_all_songs(&self) -> Result<Vec<SongRecord>, CatalogStoreError> {
        self.inner.get_all_songs().await
    }

    async fn get_song_by_id(&self, id: SongId) -> Result<Option<SongRecord>, CatalogStoreError> {
        self.inner.get_song_by_id(id).await
    }

    async fn update_song(&self, _id: SongId, _update: &SongUpdate) -> Result<(), CatalogStoreError> {
        Err(CatalogStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "database is read-only",
        )))
    }

    async fn delete_song(&self, _id: SongId) -> Result<(), CatalogStoreError> {
        Err(CatalogStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "database is read-only",
        )))
    }
}

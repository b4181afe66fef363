//! Acoustic fallback identification
//!
//! Last resort when text search finds no confident match: fingerprint the
//! audio and look it up on AcoustID. Every failure degrades to `None`;
//! nothing here writes to the catalog.

use crate::services::acoustid_client::{AcoustIDClient, AcoustIDError};
use crate::services::fingerprinter::{FingerprintError, Fingerprinter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info, warn};

/// Recording identified from audio
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintMatch {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub year: Option<i32>,
    /// Lookup confidence, 0.0–1.0
    pub score: f64,
    pub recording_id: String,
    pub release_id: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
}

/// Identifies songs from their audio
#[async_trait]
pub trait SongIdentifier: Send + Sync {
    /// Engine and credential both present
    fn is_available(&self) -> bool;

    /// Best match for one file; `None` on any failure
    async fn identify_song(&self, path: &Path) -> Option<FingerprintMatch>;

    /// Identify several files, keeping matches with `score >= min_score`
    ///
    /// Every input file appears in the result. Never fails.
    async fn batch_identify(
        &self,
        files: &[PathBuf],
        min_score: f64,
    ) -> HashMap<PathBuf, Option<FingerprintMatch>> {
        let mut results = HashMap::with_capacity(files.len());
        for file in files {
            let identified = self
                .identify_song(file)
                .await
                .filter(|m| m.score >= min_score);
            results.insert(file.clone(), identified);
        }
        results
    }
}

/// fpcalc + AcoustID identifier
pub struct AcousticFallbackIdentifier {
    fingerprinter: Option<Fingerprinter>,
    client: Option<AcoustIDClient>,
    /// Why the identifier is unavailable, if it is
    unavailable_reason: Option<String>,
    unavailable_logged: Once,
}

impl AcousticFallbackIdentifier {
    /// Build from configuration; missing pieces make the identifier
    /// unavailable rather than failing
    pub fn new(fpcalc_path: Option<&Path>, api_key: Option<String>) -> Self {
        let mut reasons = Vec::new();

        let fingerprinter = match Fingerprinter::new(fpcalc_path) {
            Ok(f) => Some(f),
            Err(e) => {
                reasons.push(e.to_string());
                None
            }
        };

        let client = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => match AcoustIDClient::new(key) {
                Ok(c) => Some(c),
                Err(e) => {
                    reasons.push(e.to_string());
                    None
                }
            },
            None => {
                reasons.push("AcoustID API key not configured".to_string());
                None
            }
        };

        let unavailable_reason = if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        };

        Self {
            fingerprinter,
            client,
            unavailable_reason,
            unavailable_logged: Once::new(),
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }
}

#[async_trait]
impl SongIdentifier for AcousticFallbackIdentifier {
    fn is_available(&self) -> bool {
        match &self.unavailable_reason {
            None => true,
            Some(reason) => {
                self.unavailable_logged.call_once(|| {
                    warn!(reason = %reason, "Fingerprint fallback unavailable");
                });
                false
            }
        }
    }

    async fn identify_song(&self, path: &Path) -> Option<FingerprintMatch> {
        if !self.is_available() {
            return None;
        }
        let (fingerprinter, client) = (self.fingerprinter.as_ref()?, self.client.as_ref()?);

        let fingerprint = match fingerprinter.fingerprint_file(path).await {
            Ok(fp) => fp,
            Err(FingerprintError::FileNotFound(p)) => {
                debug!(file = %p, "Skipping fingerprint, file missing");
                return None;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Fingerprint generation failed");
                return None;
            }
        };

        let duration_seconds = fingerprint.duration.round().max(0.0) as u64;
        let response = match client.lookup(&fingerprint.fingerprint, duration_seconds).await {
            Ok(r) => r,
            Err(AcoustIDError::NoMatches) => {
                debug!(file = %path.display(), "No AcoustID match");
                return None;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "AcoustID lookup failed");
                return None;
            }
        };

        let best = AcoustIDClient::best_match(&response)?;
        info!(
            file = %path.display(),
            recording_id = %best.recording_id,
            score = best.score,
            "Song identified by fingerprint"
        );

        Some(FingerprintMatch {
            title: best.title,
            artist: best.artist,
            album: best.album,
            year: best.year,
            score: best.score,
            recording_id: best.recording_id,
            release_id: best.release_id,
            duration: best.duration.or(Some(fingerprint.duration)),
        })
    }
}

//! Stage 3: RESOLVING
//!
//! Each cleaned song is searched across the configured catalogs. Severe
//! songs with no confident match fall back to fingerprint identification
//! when an identifier is available.
//!
//! Every cleaned song ends the stage with a [`ResolutionOutcome`]; per-song
//! problems never abort the run.

use super::{band_progress, RunContext, WorkflowOrchestrator};
use crate::error::{MrError, MrResult};
use crate::events::WorkflowEvent;
use crate::models::{
    CandidateSource, CleanedSong, CorruptionLevel, MatchCandidate, PipelineState,
    ResolutionOutcome, ResolvedSong, RunError, SongId, StageSummary,
};
use crate::services::fallback_identifier::FingerprintMatch;
use crate::services::metadata_resolver::get_best_match;
use std::path::{Path, PathBuf};

/// Fallback runs only for severe songs that text search could not resolve
pub fn should_attempt_fallback(level: CorruptionLevel, best: Option<&MatchCandidate>) -> bool {
    level == CorruptionLevel::Severe && best.is_none()
}

/// Candidate built from a fingerprint match, score scaled to 0–100
pub fn fallback_candidate(found: FingerprintMatch) -> MatchCandidate {
    MatchCandidate {
        title: found.title,
        artist: found.artist,
        album: found.album,
        year: found.year,
        duration: found.duration,
        score: (found.score * 100.0).clamp(0.0, 100.0),
        source: CandidateSource::FallbackFingerprint,
        recording_id: Some(found.recording_id),
        release_id: found.release_id,
    }
}

impl WorkflowOrchestrator {
    pub(super) async fn phase_resolving(&self, ctx: &mut RunContext) -> MrResult<()> {
        self.transition(ctx, PipelineState::Resolving);
        self.report_progress(ctx, 40, "Resolving metadata...".to_string());

        tracing::info!(
            run_id = %ctx.run_id(),
            songs = ctx.bundle.cleaned.len(),
            enabled = ctx.options.fetch_metadata,
            "Stage 3: RESOLVING"
        );

        if !ctx.options.fetch_metadata {
            ctx.bundle.fetched = ctx
                .bundle
                .cleaned
                .iter()
                .map(|c| not_attempted(c.song_id))
                .collect();
        } else {
            self.resolve_all(ctx).await?;
        }

        let summary = StageSummary::from_outcomes(ctx.bundle.fetched.iter().map(|r| &r.outcome));
        self.report_progress(ctx, 90, "Resolution complete".to_string());
        self.complete_stage(ctx, summary);
        Ok(())
    }

    async fn resolve_all(&self, ctx: &mut RunContext) -> MrResult<()> {
        let total = ctx.bundle.cleaned.len();
        let min_confidence = ctx.options.min_confidence;

        for done in 0..total {
            if ctx.cancel.is_cancelled() {
                let remaining: Vec<ResolvedSong> = ctx.bundle.cleaned[done..]
                    .iter()
                    .map(|c| not_attempted(c.song_id))
                    .collect();
                ctx.bundle.fetched.extend(remaining);
                return Err(MrError::Cancelled);
            }

            let entry = ctx.bundle.cleaned[done].clone();
            let (duration, path) = match ctx.song(entry.song_id) {
                Some(song) => (song.duration, song.file_path.clone()),
                None => (None, PathBuf::new()),
            };

            let (resolved, warning) = self
                .resolve_song(&entry, duration, &path, min_confidence)
                .await;
            if let Some(warning) = warning {
                ctx.bundle.errors.push(warning);
            }
            ctx.bundle.fetched.push(resolved);

            let percentage = band_progress(40, 90, done + 1, total);
            let message = format!("Resolved {}/{}", done + 1, total);
            ctx.session.update_progress(percentage, message.clone());
            self.event_bus.emit_lossy(WorkflowEvent::Progress {
                run_id: ctx.run_id(),
                percentage,
                message,
            });
        }

        Ok(())
    }

    /// Resolve one song; the second value is a warning for the run log
    async fn resolve_song(
        &self,
        entry: &CleanedSong,
        duration: Option<f64>,
        path: &Path,
        min_confidence: f64,
    ) -> (ResolvedSong, Option<RunError>) {
        let song_id = entry.song_id;
        let report = self
            .resolver
            .search_with_report(
                entry.cleaned.query_title(),
                entry.cleaned.query_artist(),
                duration,
            )
            .await;
        let best = get_best_match(&report.candidates, min_confidence);

        if should_attempt_fallback(entry.level, best.as_ref()) {
            if let Some(resolved) = self.try_fallback(song_id, path, min_confidence).await {
                return (resolved, None);
            }
        }

        if let Some(best) = best {
            tracing::debug!(
                song_id,
                source = %best.source,
                score = best.score,
                "Catalog match accepted"
            );
            return (
                ResolvedSong {
                    song_id,
                    candidate: Some(best),
                    outcome: ResolutionOutcome::Matched,
                },
                None,
            );
        }

        if report.sources_queried == 0 && !report.from_cache {
            tracing::debug!(song_id, "No search terms or catalogs, song not resolved");
            return (not_attempted(song_id), None);
        }

        if report.all_failed() {
            tracing::warn!(
                song_id,
                failed = report.sources_failed(),
                "Every catalog failed for song"
            );
            let warning = RunError::warning(
                Some(song_id),
                "SOURCES_UNREACHABLE",
                report
                    .failures
                    .iter()
                    .map(|(source, error)| format!("{}: {}", source, error))
                    .collect::<Vec<_>>()
                    .join("; "),
            );
            return (
                ResolvedSong {
                    song_id,
                    candidate: None,
                    outcome: ResolutionOutcome::SourcesUnreachable,
                },
                Some(warning),
            );
        }

        tracing::debug!(
            song_id,
            candidates = report.candidates.len(),
            "No candidate met the confidence threshold"
        );
        (
            ResolvedSong {
                song_id,
                candidate: None,
                outcome: ResolutionOutcome::LowConfidence,
            },
            None,
        )
    }

    /// `None` when the fallback is unavailable or found nothing
    async fn try_fallback(
        &self,
        song_id: SongId,
        path: &Path,
        min_confidence: f64,
    ) -> Option<ResolvedSong> {
        let identifier = self.identifier.as_ref().filter(|i| i.is_available())?;
        if path.as_os_str().is_empty() {
            return None;
        }

        let found = identifier.identify_song(path).await?;
        let candidate = fallback_candidate(found);

        if candidate.score >= min_confidence {
            tracing::info!(
                song_id,
                score = candidate.score,
                title = %candidate.title,
                "Fingerprint fallback matched"
            );
            Some(ResolvedSong {
                song_id,
                candidate: Some(candidate),
                outcome: ResolutionOutcome::FallbackMatched,
            })
        } else {
            tracing::debug!(song_id, score = candidate.score, "Fingerprint match below threshold");
            Some(ResolvedSong {
                song_id,
                candidate: None,
                outcome: ResolutionOutcome::LowConfidence,
            })
        }
    }
}

fn not_attempted(song_id: SongId) -> ResolvedSong {
    ResolvedSong {
        song_id,
        candidate: None,
        outcome: ResolutionOutcome::NotAttempted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: f64) -> MatchCandidate {
        MatchCandidate {
            title: "Lithium".to_string(),
            artist: "Nirvana".to_string(),
            album: None,
            year: None,
            duration: None,
            score,
            source: CandidateSource::MusicBrainz,
            recording_id: None,
            release_id: None,
        }
    }

    #[test]
    fn test_fallback_only_for_severe_without_match() {
        assert!(should_attempt_fallback(CorruptionLevel::Severe, None));
        assert!(!should_attempt_fallback(CorruptionLevel::Severe, Some(&candidate(90.0))));
        assert!(!should_attempt_fallback(CorruptionLevel::Moderate, None));
        assert!(!should_attempt_fallback(CorruptionLevel::Minor, None));
    }

    #[test]
    fn test_fallback_candidate_scales_score() {
        let found = FingerprintMatch {
            title: "Lithium".to_string(),
            artist: "Nirvana".to_string(),
            album: Some("Nevermind".to_string()),
            year: Some(1991),
            score: 0.87,
            recording_id: "rec-1".to_string(),
            release_id: None,
            duration: Some(257.0),
        };
        let c = fallback_candidate(found);
        assert!((c.score - 87.0).abs() < 1e-9);
        assert_eq!(c.source, CandidateSource::FallbackFingerprint);
        assert_eq!(c.recording_id.as_deref(), Some("rec-1"));
    }
}

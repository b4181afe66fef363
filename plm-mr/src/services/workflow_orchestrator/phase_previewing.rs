//! Stage 4: PREVIEWING
//!
//! One entry per cleaned song, in cleaning order. Resolved songs propose the
//! matched values; everything else proposes the cleaned values at a fixed
//! confidence so it is never mistaken for a corroborated match.

use super::{RunContext, WorkflowOrchestrator};
use crate::error::MrResult;
use crate::models::{
    CleanedSong, OriginalMetadata, PipelineState, PreviewEntry, PreviewStatus, ProposedMetadata,
    ResolutionOutcome, ResolvedSong, SongRecord, StageSummary, CLEANED_ONLY_CONFIDENCE,
    CLEANED_SOURCE,
};

/// Build the preview entry for one cleaned song
pub(super) fn build_entry(
    song: Option<&SongRecord>,
    cleaned: &CleanedSong,
    resolved: Option<&ResolvedSong>,
) -> PreviewEntry {
    let original = song
        .map(|s| OriginalMetadata {
            title: s.title_str().to_string(),
            artist: s.artist_str().to_string(),
            album: s.album_str().to_string(),
        })
        .unwrap_or_default();
    let resolution = resolved
        .map(|r| r.outcome)
        .unwrap_or(ResolutionOutcome::NotAttempted);

    let base = PreviewEntry {
        song_id: cleaned.song_id,
        original,
        proposed: ProposedMetadata {
            title: cleaned.cleaned.title.clone(),
            artist: cleaned.cleaned.artist.clone(),
            album: cleaned.cleaned.album.clone(),
            year: None,
        },
        confidence: CLEANED_ONLY_CONFIDENCE,
        source: CLEANED_SOURCE.to_string(),
        status: PreviewStatus::CleanedOnly,
        resolution,
        corruption_level: cleaned.level,
        issues: cleaned.cleaned.issues.clone(),
        release_id: None,
    };

    match resolved.and_then(|r| r.candidate.as_ref()) {
        Some(candidate) => PreviewEntry {
            proposed: ProposedMetadata {
                title: candidate.title.clone(),
                artist: candidate.artist.clone(),
                album: candidate
                    .album
                    .clone()
                    .unwrap_or_else(|| cleaned.cleaned.album.clone()),
                year: candidate.year,
            },
            confidence: candidate.score,
            source: candidate.source.as_str().to_string(),
            status: PreviewStatus::Fetched,
            release_id: candidate.release_id.clone(),
            ..base
        },
        None => base,
    }
}

impl WorkflowOrchestrator {
    pub(super) fn phase_previewing(&self, ctx: &mut RunContext) -> MrResult<()> {
        self.transition(ctx, PipelineState::Previewing);
        tracing::info!(run_id = %ctx.run_id(), "Stage 4: PREVIEWING");

        let preview: Vec<PreviewEntry> = ctx
            .bundle
            .cleaned
            .iter()
            .map(|cleaned| {
                let resolved = ctx
                    .bundle
                    .fetched
                    .iter()
                    .find(|r| r.song_id == cleaned.song_id);
                build_entry(ctx.song(cleaned.song_id), cleaned, resolved)
            })
            .collect();

        let fetched = preview
            .iter()
            .filter(|p| p.status == PreviewStatus::Fetched)
            .count();
        let summary = StageSummary::Preview {
            entries: preview.len(),
            fetched,
            cleaned_only: preview.len() - fetched,
        };
        ctx.bundle.preview = preview;

        self.report_progress(ctx, 99, "Preview ready".to_string());
        self.complete_stage(ctx, summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSource, CleanedMetadata, CorruptionLevel, MatchCandidate};
    use std::path::PathBuf;

    fn cleaned_song() -> CleanedSong {
        CleanedSong {
            song_id: 3,
            level: CorruptionLevel::Severe,
            cleaned: CleanedMetadata {
                title: "Smells Like Teen Spirit".to_string(),
                artist: "Nirvana".to_string(),
                album: "".to_string(),
                ..Default::default()
            },
        }
    }

    fn record() -> SongRecord {
        SongRecord {
            id: 3,
            title: Some("00 - 00 - Nirvana - Smells Like Teen Spirit_20240101_120000".to_string()),
            artist: None,
            album: Some("Unknown Album".to_string()),
            year: None,
            duration: Some(301.0),
            file_path: PathBuf::from("/m/a.mp3"),
            bitrate: None,
        }
    }

    #[test]
    fn test_unresolved_entry_is_cleaned_only() {
        let entry = build_entry(Some(&record()), &cleaned_song(), None);
        assert_eq!(entry.status, PreviewStatus::CleanedOnly);
        assert_eq!(entry.confidence, CLEANED_ONLY_CONFIDENCE);
        assert_eq!(entry.source, CLEANED_SOURCE);
        assert_eq!(entry.resolution, ResolutionOutcome::NotAttempted);
        assert_eq!(entry.proposed.artist, "Nirvana");
        assert_eq!(entry.original.album, "Unknown Album");
    }

    #[test]
    fn test_resolved_entry_uses_candidate() {
        let resolved = ResolvedSong {
            song_id: 3,
            candidate: Some(MatchCandidate {
                title: "Smells Like Teen Spirit".to_string(),
                artist: "Nirvana".to_string(),
                album: Some("Nevermind".to_string()),
                year: Some(1991),
                duration: Some(301.0),
                score: 100.0,
                source: CandidateSource::Deezer,
                recording_id: None,
                release_id: None,
            }),
            outcome: ResolutionOutcome::Matched,
        };
        let entry = build_entry(Some(&record()), &cleaned_song(), Some(&resolved));
        assert_eq!(entry.status, PreviewStatus::Fetched);
        assert_eq!(entry.source, "deezer");
        assert_eq!(entry.proposed.album, "Nevermind");
        assert_eq!(entry.proposed.year, Some(1991));
        assert_eq!(entry.confidence, 100.0);
    }

    #[test]
    fn test_low_confidence_keeps_outcome() {
        let resolved = ResolvedSong {
            song_id: 3,
            candidate: None,
            outcome: ResolutionOutcome::LowConfidence,
        };
        let entry = build_entry(None, &cleaned_song(), Some(&resolved));
        assert_eq!(entry.status, PreviewStatus::CleanedOnly);
        assert_eq!(entry.resolution, ResolutionOutcome::LowConfidence);
        assert_eq!(entry.original, OriginalMetadata::default());
    }
}

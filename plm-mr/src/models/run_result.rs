//! Pipeline run results and per-song errors

use crate::models::{
    CleanedMetadata, CorruptionLevel, CorruptionReport, MatchCandidate, PipelineState,
    PreviewEntry, ResolutionOutcome, SongId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorSeverity {
    /// Degraded result for one song, run continues
    Warning,
    /// Song cannot be processed, run continues
    Skip,
    /// Run cannot continue
    Critical,
}

/// Error recorded during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    /// Song that caused the error, if any
    pub song_id: Option<SongId>,

    /// Error code (e.g. "SONG_NOT_FOUND", "CATALOG_READ")
    pub error_code: String,

    /// Human-readable error message
    pub error_message: String,

    pub severity: ErrorSeverity,

    pub occurred_at: DateTime<Utc>,
}

impl RunError {
    fn new(
        song_id: Option<SongId>,
        error_code: &str,
        error_message: String,
        severity: ErrorSeverity,
    ) -> Self {
        Self {
            song_id,
            error_code: error_code.to_string(),
            error_message,
            severity,
            occurred_at: Utc::now(),
        }
    }

    /// Create new warning
    pub fn warning(song_id: Option<SongId>, error_code: &str, error_message: String) -> Self {
        Self::new(song_id, error_code, error_message, ErrorSeverity::Warning)
    }

    /// Create new skip error
    pub fn skip(song_id: Option<SongId>, error_code: &str, error_message: String) -> Self {
        Self::new(song_id, error_code, error_message, ErrorSeverity::Skip)
    }

    /// Create new critical error
    pub fn critical(song_id: Option<SongId>, error_code: &str, error_message: String) -> Self {
        Self::new(song_id, error_code, error_message, ErrorSeverity::Critical)
    }
}

/// Output of the Clean stage for one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedSong {
    pub song_id: SongId,
    pub level: CorruptionLevel,
    pub cleaned: CleanedMetadata,
}

/// Output of the Resolve stage for one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSong {
    pub song_id: SongId,
    /// Accepted match, if any
    pub candidate: Option<MatchCandidate>,
    pub outcome: ResolutionOutcome,
}

/// Summary attached to a stage-completion notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageSummary {
    Analyze {
        total: usize,
        clean: usize,
        minor: usize,
        moderate: usize,
        severe: usize,
    },
    Clean {
        cleaned: usize,
        skipped_clean: usize,
    },
    Resolve {
        matched: usize,
        fallback_matched: usize,
        low_confidence: usize,
        sources_unreachable: usize,
        not_attempted: usize,
    },
    Preview {
        entries: usize,
        fetched: usize,
        cleaned_only: usize,
    },
    Finish {
        preview_entries: usize,
        errors: usize,
    },
}

impl StageSummary {
    /// Resolve summary tallied from per-song outcomes
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ResolutionOutcome>) -> Self {
        let (mut matched, mut fallback_matched, mut low_confidence) = (0, 0, 0);
        let (mut sources_unreachable, mut not_attempted) = (0, 0);
        for outcome in outcomes {
            match outcome {
                ResolutionOutcome::Matched => matched += 1,
                ResolutionOutcome::FallbackMatched => fallback_matched += 1,
                ResolutionOutcome::LowConfidence => low_confidence += 1,
                ResolutionOutcome::SourcesUnreachable => sources_unreachable += 1,
                ResolutionOutcome::NotAttempted => not_attempted += 1,
            }
        }
        StageSummary::Resolve {
            matched,
            fallback_matched,
            low_confidence,
            sources_unreachable,
            not_attempted,
        }
    }
}

/// Everything a run produced
///
/// On cancellation or a fatal error the bundle holds whatever the completed
/// stages produced; nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineBundle {
    pub run_id: Uuid,
    /// Terminal state of the run
    pub state: PipelineState,
    pub analysis: Option<CorruptionReport>,
    /// Cleaned metadata for every non-clean song, in input order
    pub cleaned: Vec<CleanedSong>,
    /// Resolution outcome per cleaned song, in input order
    pub fetched: Vec<ResolvedSong>,
    /// Proposed corrections, in input order
    pub preview: Vec<PreviewEntry>,
    pub errors: Vec<RunError>,
}

impl PipelineBundle {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: PipelineState::Idle,
            analysis: None,
            cleaned: Vec::new(),
            fetched: Vec::new(),
            preview: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Count errors by severity
    pub fn count_by_severity(&self, severity: ErrorSeverity) -> usize {
        self.errors.iter().filter(|e| e.severity == severity).count()
    }

    pub fn preview_for(&self, song_id: SongId) -> Option<&PreviewEntry> {
        self.preview.iter().find(|p| p.song_id == song_id)
    }

    pub fn cleaned_for(&self, song_id: SongId) -> Option<&CleanedSong> {
        self.cleaned.iter().find(|c| c.song_id == song_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors_set_severity() {
        assert_eq!(
            RunError::warning(Some(1), "X", "x".into()).severity,
            ErrorSeverity::Warning
        );
        assert_eq!(RunError::skip(None, "X", "x".into()).severity, ErrorSeverity::Skip);
        assert_eq!(
            RunError::critical(None, "X", "x".into()).severity,
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_resolve_summary_counts() {
        let outcomes = [
            ResolutionOutcome::Matched,
            ResolutionOutcome::Matched,
            ResolutionOutcome::LowConfidence,
            ResolutionOutcome::SourcesUnreachable,
        ];
        assert_eq!(
            StageSummary::from_outcomes(outcomes.iter()),
            StageSummary::Resolve {
                matched: 2,
                fallback_matched: 0,
                low_confidence: 1,
                sources_unreachable: 1,
                not_attempted: 0,
            }
        );
    }

    #[test]
    fn test_bundle_severity_count() {
        let mut bundle = PipelineBundle::new(Uuid::new_v4());
        bundle.errors.push(RunError::skip(Some(3), "SONG_NOT_FOUND", "gone".into()));
        assert_eq!(bundle.count_by_severity(ErrorSeverity::Skip), 1);
        assert_eq!(bundle.count_by_severity(ErrorSeverity::Critical), 0);
    }

    #[test]
    fn test_summary_serializes_with_stage_tag() {
        let json = serde_json::to_value(StageSummary::Clean {
            cleaned: 2,
            skipped_clean: 5,
        })
        .unwrap();
        assert_eq!(json["stage"], "clean");
        assert_eq!(json["skipped_clean"], 5);
    }
}

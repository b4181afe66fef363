//! Data models for plm-mr (metadata resolution)
//!
//! Pure data. Behaviour lives in `services`.

pub mod candidate;
pub mod correction;
pub mod corruption;
pub mod metadata;
pub mod parameters;
pub mod pipeline_session;
pub mod preview;
pub mod run_result;
pub mod song;

pub use candidate::{sort_by_score, CandidateSource, MatchCandidate};
pub use correction::{ActionType, ApplyReport, CorrectionAction, CorrectionResult};
pub use corruption::{CorruptionLevel, CorruptionReport, SongCorruption};
pub use metadata::{
    CleanedMetadata, IssueTag, FIELD_ALBUM, FIELD_ARTIST, FIELD_TITLE, UNKNOWN_ALBUM,
    UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
pub use parameters::{PipelineOptions, DEFAULT_MIN_CONFIDENCE};
pub use pipeline_session::{PipelineProgress, PipelineSession, PipelineState, StateTransition};
pub use preview::{
    OriginalMetadata, PreviewEntry, PreviewStatus, ProposedMetadata, ResolutionOutcome,
    CLEANED_ONLY_CONFIDENCE, CLEANED_SOURCE,
};
pub use run_result::{
    CleanedSong, ErrorSeverity, PipelineBundle, ResolvedSong, RunError, StageSummary,
};
pub use song::{SongId, SongRecord, SongUpdate};

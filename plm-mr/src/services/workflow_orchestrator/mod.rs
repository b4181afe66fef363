//! Metadata pipeline orchestrator
//!
//! # State Progression
//! IDLE → ANALYZING → CLEANING → RESOLVING → PREVIEWING → DONE
//!
//! ERROR is reachable from any stage and CANCELLED from any point between
//! songs. Both keep whatever partial results exist; nothing is rolled back.
//!
//! Each stage lives in its own `phase_*` file. A run executes on one
//! background task and processes songs sequentially, in the order supplied.
//!
//! | Stage      | Progress band |
//! |------------|---------------|
//! | Analyzing  | 0–20 %        |
//! | Cleaning   | 20–40 %       |
//! | Resolving  | 40–90 %       |
//! | Previewing | 90–100 %      |

use crate::db::songs::SongCatalog;
use crate::error::{MrError, MrResult};
use crate::events::{WorkflowEvent, WorkflowEventBus};
use crate::models::{
    PipelineBundle, PipelineOptions, PipelineSession, PipelineState, RunError, SongId, SongRecord,
    StageSummary,
};
use crate::services::fallback_identifier::SongIdentifier;
use crate::services::metadata_resolver::MetadataResolver;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

mod phase_analyzing;
mod phase_cleaning;
mod phase_previewing;
mod phase_resolving;

pub use phase_resolving::{fallback_candidate, should_attempt_fallback};

/// Working state of one run, threaded through the phases
pub(super) struct RunContext {
    session: PipelineSession,
    bundle: PipelineBundle,
    options: PipelineOptions,
    /// Songs in the order supplied by the caller
    songs: Vec<SongRecord>,
    index: HashMap<SongId, usize>,
    cancel: CancellationToken,
}

impl RunContext {
    fn new(options: PipelineOptions, cancel: CancellationToken) -> Self {
        let session = PipelineSession::new();
        let bundle = PipelineBundle::new(session.run_id);
        Self {
            session,
            bundle,
            options,
            songs: Vec::new(),
            index: HashMap::new(),
            cancel,
        }
    }

    fn run_id(&self) -> Uuid {
        self.session.run_id
    }

    fn song(&self, id: SongId) -> Option<&SongRecord> {
        self.index.get(&id).map(|&i| &self.songs[i])
    }

    /// Cooperative cancellation point
    fn checkpoint(&self) -> MrResult<()> {
        if self.cancel.is_cancelled() {
            Err(MrError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Percentage within a stage's band after `done` of `total` units
pub(super) fn band_progress(start: u8, end: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return end;
    }
    let span = (end - start) as usize;
    start + (span * done.min(total) / total) as u8
}

/// Handle to a run started with [`WorkflowOrchestrator::start`]
pub struct PipelineHandle {
    pub run_id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<PipelineBundle>,
}

impl PipelineHandle {
    /// Request cancellation; takes effect at the next song boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal bundle
    pub async fn wait(self) -> MrResult<PipelineBundle> {
        self.task
            .await
            .map_err(|e| MrError::Internal(format!("pipeline task failed: {}", e)))
    }
}

/// Pipeline orchestrator service
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    catalog: Arc<dyn SongCatalog>,
    resolver: Arc<MetadataResolver>,
    identifier: Option<Arc<dyn SongIdentifier>>,
    event_bus: WorkflowEventBus,
}

impl WorkflowOrchestrator {
    pub fn new(
        catalog: Arc<dyn SongCatalog>,
        resolver: Arc<MetadataResolver>,
        event_bus: WorkflowEventBus,
    ) -> Self {
        Self {
            catalog,
            resolver,
            identifier: None,
            event_bus,
        }
    }

    /// Enable the fingerprint fallback for severe songs
    pub fn with_identifier(mut self, identifier: Arc<dyn SongIdentifier>) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn event_bus(&self) -> &WorkflowEventBus {
        &self.event_bus
    }

    /// Run the pipeline on a background task
    pub fn start(&self, song_ids: Vec<SongId>, options: PipelineOptions) -> PipelineHandle {
        let cancel = CancellationToken::new();
        let ctx = RunContext::new(options, cancel.clone());
        let run_id = ctx.run_id();

        let orchestrator = self.clone();
        let task = tokio::spawn(async move { orchestrator.execute(ctx, song_ids).await });

        PipelineHandle {
            run_id,
            cancel,
            task,
        }
    }

    /// Run the pipeline on the current task
    ///
    /// Always returns a bundle; its `state` is DONE, CANCELLED or ERROR.
    pub async fn run(
        &self,
        song_ids: Vec<SongId>,
        options: PipelineOptions,
        cancel: CancellationToken,
    ) -> PipelineBundle {
        self.execute(RunContext::new(options, cancel), song_ids).await
    }

    async fn execute(&self, mut ctx: RunContext, song_ids: Vec<SongId>) -> PipelineBundle {
        let start_time = std::time::Instant::now();

        tracing::info!(
            run_id = %ctx.run_id(),
            songs = song_ids.len(),
            fetch_metadata = ctx.options.fetch_metadata,
            min_confidence = ctx.options.min_confidence,
            "Starting metadata pipeline"
        );

        self.event_bus.emit_lossy(WorkflowEvent::Started {
            run_id: ctx.run_id(),
            total_songs: song_ids.len(),
        });

        match self.execute_stages(&mut ctx, &song_ids).await {
            Ok(()) => self.finish(&mut ctx, start_time),
            Err(MrError::Cancelled) => self.finish_cancelled(&mut ctx),
            Err(e) => self.finish_failed(&mut ctx, e),
        }

        ctx.bundle
    }

    async fn execute_stages(&self, ctx: &mut RunContext, song_ids: &[SongId]) -> MrResult<()> {
        self.load_songs(ctx, song_ids).await?;
        ctx.checkpoint()?;

        self.phase_analyzing(ctx)?;
        ctx.checkpoint()?;

        self.phase_cleaning(ctx)?;
        ctx.checkpoint()?;

        self.phase_resolving(ctx).await?;
        ctx.checkpoint()?;

        self.phase_previewing(ctx)
    }

    /// One batch read; ids missing from the catalog are skipped
    async fn load_songs(&self, ctx: &mut RunContext, song_ids: &[SongId]) -> MrResult<()> {
        let all = self.catalog.get_all_songs().await?;
        let mut by_id: HashMap<SongId, SongRecord> =
            all.into_iter().map(|song| (song.id, song)).collect();

        for &id in song_ids {
            if ctx.index.contains_key(&id) {
                tracing::debug!(song_id = id, "Duplicate song id in request, ignoring");
                continue;
            }
            match by_id.remove(&id) {
                Some(song) => {
                    ctx.index.insert(id, ctx.songs.len());
                    ctx.songs.push(song);
                }
                None => {
                    tracing::warn!(song_id = id, "Song not found in catalog, skipping");
                    ctx.bundle.errors.push(RunError::skip(
                        Some(id),
                        "SONG_NOT_FOUND",
                        format!("Song {} not found in catalog", id),
                    ));
                }
            }
        }

        Ok(())
    }

    pub(super) fn transition(&self, ctx: &mut RunContext, new_state: PipelineState) {
        let transition = ctx.session.transition_to(new_state);
        ctx.bundle.state = new_state;

        tracing::debug!(
            run_id = %transition.run_id,
            old = %transition.old_state,
            new = %transition.new_state,
            "Pipeline state changed"
        );

        self.event_bus.emit_lossy(WorkflowEvent::StateChanged {
            run_id: transition.run_id,
            old: transition.old_state,
            new: transition.new_state,
        });
    }

    pub(super) fn report_progress(&self, ctx: &mut RunContext, percentage: u8, message: String) {
        ctx.session.update_progress(percentage, message.clone());
        self.event_bus.emit_lossy(WorkflowEvent::Progress {
            run_id: ctx.run_id(),
            percentage: ctx.session.progress.percentage,
            message,
        });
    }

    pub(super) fn complete_stage(&self, ctx: &RunContext, summary: StageSummary) {
        let Some(stage_number) = ctx.session.state.stage_number() else {
            return;
        };
        tracing::info!(
            run_id = %ctx.run_id(),
            stage = stage_number,
            summary = ?summary,
            "Stage completed"
        );
        self.event_bus.emit_lossy(WorkflowEvent::StageCompleted {
            run_id: ctx.run_id(),
            stage_number,
            summary,
        });
    }

    fn finish(&self, ctx: &mut RunContext, start_time: std::time::Instant) {
        self.transition(ctx, PipelineState::Done);
        self.report_progress(ctx, 100, "Pipeline completed".to_string());
        self.complete_stage(
            ctx,
            StageSummary::Finish {
                preview_entries: ctx.bundle.preview.len(),
                errors: ctx.bundle.errors.len(),
            },
        );

        tracing::info!(
            run_id = %ctx.run_id(),
            preview_entries = ctx.bundle.preview.len(),
            errors = ctx.bundle.errors.len(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Metadata pipeline completed"
        );

        self.event_bus.emit_lossy(WorkflowEvent::Completed {
            run_id: ctx.run_id(),
            bundle: Arc::new(ctx.bundle.clone()),
        });
    }

    fn finish_cancelled(&self, ctx: &mut RunContext) {
        self.transition(ctx, PipelineState::Cancelled);
        tracing::warn!(
            run_id = %ctx.run_id(),
            cleaned = ctx.bundle.cleaned.len(),
            fetched = ctx.bundle.fetched.len(),
            "Metadata pipeline cancelled"
        );
        self.event_bus.emit_lossy(WorkflowEvent::Cancelled {
            run_id: ctx.run_id(),
            partial: Arc::new(ctx.bundle.clone()),
        });
    }

    fn finish_failed(&self, ctx: &mut RunContext, error: MrError) {
        let failed_in = ctx.session.state;
        ctx.bundle
            .errors
            .push(RunError::critical(None, error.code(), error.to_string()));
        self.transition(ctx, PipelineState::Error);

        tracing::error!(
            run_id = %ctx.run_id(),
            stage = %failed_in,
            error = %error,
            "Metadata pipeline failed"
        );

        self.event_bus.emit_lossy(WorkflowEvent::Failed {
            run_id: ctx.run_id(),
            error: error.to_string(),
            partial: Arc::new(ctx.bundle.clone()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_progress() {
        assert_eq!(band_progress(40, 90, 0, 10), 40);
        assert_eq!(band_progress(40, 90, 5, 10), 65);
        assert_eq!(band_progress(40, 90, 10, 10), 90);
        assert_eq!(band_progress(20, 40, 0, 0), 40);
        assert_eq!(band_progress(20, 40, 7, 3), 40);
    }

    #[test]
    fn test_checkpoint_reports_cancellation() {
        let cancel = CancellationToken::new();
        let ctx = RunContext::new(PipelineOptions::default(), cancel.clone());
        assert!(ctx.checkpoint().is_ok());
        cancel.cancel();
        assert!(matches!(ctx.checkpoint(), Err(MrError::Cancelled)));
    }
}

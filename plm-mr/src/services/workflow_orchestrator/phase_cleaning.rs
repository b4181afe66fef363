//! Stage 2: CLEANING
//!
//! Non-clean songs get cleaned metadata; a combined "Artist - Title" is
//! split once the field cleaners have run. Clean songs are skipped.

use super::{band_progress, RunContext, WorkflowOrchestrator};
use crate::error::MrResult;
use crate::events::WorkflowEvent;
use crate::models::{CleanedSong, CorruptionLevel, PipelineState, StageSummary};
use crate::services::corruption_classifier::{clean_song, detect_corruption_level, split_combined_title};

impl WorkflowOrchestrator {
    pub(super) fn phase_cleaning(&self, ctx: &mut RunContext) -> MrResult<()> {
        self.transition(ctx, PipelineState::Cleaning);
        tracing::info!(run_id = %ctx.run_id(), "Stage 2: CLEANING");

        let total = ctx.songs.len();
        let mut skipped_clean = 0;

        for (done, song) in ctx.songs.iter().enumerate() {
            ctx.checkpoint()?;

            let level = ctx
                .bundle
                .analysis
                .as_ref()
                .and_then(|report| report.level_of(song.id))
                .unwrap_or_else(|| detect_corruption_level(song));

            if level == CorruptionLevel::Clean {
                skipped_clean += 1;
            } else {
                let cleaned = split_combined_title(clean_song(song));
                tracing::debug!(
                    song_id = song.id,
                    level = %level,
                    title = %cleaned.title,
                    artist = %cleaned.artist,
                    "Song cleaned"
                );
                ctx.bundle.cleaned.push(CleanedSong {
                    song_id: song.id,
                    level,
                    cleaned,
                });
            }

            let percentage = band_progress(20, 40, done + 1, total);
            self.event_bus.emit_lossy(WorkflowEvent::Progress {
                run_id: ctx.run_id(),
                percentage,
                message: format!("Cleaned {}/{}", done + 1, total),
            });
        }

        let summary = StageSummary::Clean {
            cleaned: ctx.bundle.cleaned.len(),
            skipped_clean,
        };

        self.report_progress(ctx, 40, "Cleaning complete".to_string());
        self.complete_stage(ctx, summary);
        Ok(())
    }
}

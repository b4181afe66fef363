//! Stage 1: ANALYZING
//!
//! Classifies every loaded song and stores the library report.

use super::{RunContext, WorkflowOrchestrator};
use crate::error::MrResult;
use crate::models::{CorruptionLevel, PipelineState, StageSummary};
use crate::services::corruption_classifier::analyze_library;

impl WorkflowOrchestrator {
    pub(super) fn phase_analyzing(&self, ctx: &mut RunContext) -> MrResult<()> {
        self.transition(ctx, PipelineState::Analyzing);
        self.report_progress(ctx, 0, format!("Analyzing {} songs...", ctx.songs.len()));

        let report = analyze_library(&ctx.songs);

        tracing::info!(
            run_id = %ctx.run_id(),
            total = report.total(),
            flagged = report.flagged.len(),
            "Stage 1: ANALYZING"
        );

        let summary = StageSummary::Analyze {
            total: report.total(),
            clean: report.count(CorruptionLevel::Clean),
            minor: report.count(CorruptionLevel::Minor),
            moderate: report.count(CorruptionLevel::Moderate),
            severe: report.count(CorruptionLevel::Severe),
        };
        ctx.bundle.analysis = Some(report);

        self.report_progress(ctx, 20, "Analysis complete".to_string());
        self.complete_stage(ctx, summary);
        Ok(())
    }
}

//! Pipeline and Apply notifications
//!
//! Broadcast over `plm_common::events::EventBus<WorkflowEvent>`. Callers may
//! poll (`try_recv`) or subscribe (`recv().await`).

use crate::models::{ApplyReport, PipelineBundle, PipelineState, StageSummary};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Event bus type used by the orchestrator and the applier
pub type WorkflowEventBus = plm_common::events::EventBus<WorkflowEvent>;

/// Default broadcast capacity
pub const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Run accepted
    Started { run_id: Uuid, total_songs: usize },

    StateChanged {
        run_id: Uuid,
        old: PipelineState,
        new: PipelineState,
    },

    /// Overall progress, 0–100
    Progress {
        run_id: Uuid,
        percentage: u8,
        message: String,
    },

    StageCompleted {
        run_id: Uuid,
        stage_number: u8,
        summary: StageSummary,
    },

    Completed {
        run_id: Uuid,
        bundle: Arc<PipelineBundle>,
    },

    /// Cancelled between songs; partial results attached
    Cancelled {
        run_id: Uuid,
        partial: Arc<PipelineBundle>,
    },

    /// Fatal error; partial results attached
    Failed {
        run_id: Uuid,
        error: String,
        partial: Arc<PipelineBundle>,
    },

    ApplyProgress { percentage: u8, message: String },

    ApplyCompleted { report: Arc<ApplyReport> },
}

impl WorkflowEvent {
    /// Run the event belongs to (Apply events have none)
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            WorkflowEvent::Started { run_id, .. }
            | WorkflowEvent::StateChanged { run_id, .. }
            | WorkflowEvent::Progress { run_id, .. }
            | WorkflowEvent::StageCompleted { run_id, .. }
            | WorkflowEvent::Completed { run_id, .. }
            | WorkflowEvent::Cancelled { run_id, .. }
            | WorkflowEvent::Failed { run_id, .. } => Some(*run_id),
            WorkflowEvent::ApplyProgress { .. } | WorkflowEvent::ApplyCompleted { .. } => None,
        }
    }

    /// True for the last event a run emits
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::Completed { .. }
                | WorkflowEvent::Cancelled { .. }
                | WorkflowEvent::Failed { .. }
        )
    }
}

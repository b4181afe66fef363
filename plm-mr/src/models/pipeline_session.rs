//! Pipeline run state machine
//!
//! Idle → Analyzing → Cleaning → Resolving → Previewing → Done,
//! with Error and Cancelled reachable from any non-terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Pipeline run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineState {
    /// Created, not yet started
    Idle,
    /// Corruption classification
    Analyzing,
    /// Normalizing non-clean songs
    Cleaning,
    /// Catalog search and fingerprint fallback
    Resolving,
    /// Assembling preview entries
    Previewing,
    /// Finished successfully
    Done,
    /// Cancelled by the caller
    Cancelled,
    /// Aborted by a fatal error
    Error,
}

impl PipelineState {
    /// Stage number reported in stage-completion notifications
    pub fn stage_number(&self) -> Option<u8> {
        match self {
            PipelineState::Analyzing => Some(1),
            PipelineState::Cleaning => Some(2),
            PipelineState::Resolving => Some(3),
            PipelineState::Previewing => Some(4),
            PipelineState::Done => Some(5),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Cancelled | PipelineState::Error
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "IDLE",
            PipelineState::Analyzing => "ANALYZING",
            PipelineState::Cleaning => "CLEANING",
            PipelineState::Resolving => "RESOLVING",
            PipelineState::Previewing => "PREVIEWING",
            PipelineState::Done => "DONE",
            PipelineState::Cancelled => "CANCELLED",
            PipelineState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub run_id: Uuid,
    pub old_state: PipelineState,
    pub new_state: PipelineState,
    pub transitioned_at: DateTime<Utc>,
}

/// Progress tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Overall percentage, 0–100
    pub percentage: u8,
    /// Current operation description
    pub current_operation: String,
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self {
            percentage: 0,
            current_operation: String::from("Initializing..."),
        }
    }
}

/// In-memory state of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSession {
    pub run_id: Uuid,
    pub state: PipelineState,
    pub progress: PipelineProgress,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineSession {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: PipelineState::Idle,
            progress: PipelineProgress::default(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: PipelineState) -> StateTransition {
        let transition = StateTransition {
            run_id: self.run_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    /// Update overall progress; percentage is clamped to 100
    pub fn update_progress(&mut self, percentage: u8, operation: String) {
        self.progress.percentage = percentage.min(100);
        self.progress.current_operation = operation;
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}

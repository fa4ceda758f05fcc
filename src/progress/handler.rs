//! Progress handler trait and events

use crate::pipeline::Phase;
use crate::store::{ProjectId, ProjectStatus};
use std::time::Duration;

/// Events emitted while a project moves through its phases
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Phase started for a project
    PhaseStarted { project_id: ProjectId, phase: Phase },

    /// Status or progress written to the store
    StatusChanged {
        project_id: ProjectId,
        status: ProjectStatus,
        progress: u8,
    },

    /// Setup step started
    StepStarted {
        project_id: ProjectId,
        index: usize,
        total: usize,
        title: String,
    },

    /// Setup step finished
    StepComplete {
        project_id: ProjectId,
        index: usize,
        success: bool,
    },

    /// External tool finished, whatever its outcome
    ToolFinished {
        project_id: ProjectId,
        tool: String,
        outcome: &'static str,
    },

    PhaseComplete {
        project_id: ProjectId,
        phase: Phase,
        duration: Duration,
    },

    PhaseFailed {
        project_id: ProjectId,
        phase: Phase,
        error: String,
    },
}

impl ProgressEvent {
    pub fn project_id(&self) -> ProjectId {
        match self {
            ProgressEvent::PhaseStarted { project_id, .. }
            | ProgressEvent::StatusChanged { project_id, .. }
            | ProgressEvent::StepStarted { project_id, .. }
            | ProgressEvent::StepComplete { project_id, .. }
            | ProgressEvent::ToolFinished { project_id, .. }
            | ProgressEvent::PhaseComplete { project_id, .. }
            | ProgressEvent::PhaseFailed { project_id, .. } => *project_id,
        }
    }
}

/// Trait for handling phase progress events
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

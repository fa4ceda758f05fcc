//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted { project_id, phase } => {
                info!(project_id, phase = %phase, "Starting phase");
            }
            ProgressEvent::StatusChanged {
                project_id,
                status,
                progress,
            } => {
                debug!(project_id, status = %status, progress, "Project status updated");
            }
            ProgressEvent::StepStarted {
                project_id,
                index,
                total,
                title,
            } => {
                info!(
                    project_id,
                    step = format!("{}/{}", index, total),
                    title = %title,
                    "Setup step started"
                );
            }
            ProgressEvent::StepComplete {
                project_id,
                index,
                success,
            } => {
                if *success {
                    debug!(project_id, step = index, "Setup step complete");
                } else {
                    warn!(project_id, step = index, "Setup step failed");
                }
            }
            ProgressEvent::ToolFinished {
                project_id,
                tool,
                outcome,
            } => {
                debug!(project_id, tool = %tool, outcome, "Tool finished");
            }
            ProgressEvent::PhaseComplete {
                project_id,
                phase,
                duration,
            } => {
                info!(
                    project_id,
                    phase = %phase,
                    duration_ms = duration.as_millis() as u64,
                    "Phase complete"
                );
            }
            ProgressEvent::PhaseFailed {
                project_id,
                phase,
                error,
            } => {
                warn!(project_id, phase = %phase, error = %error, "Phase failed");
            }
        }
    }
}

use super::orchestrator::PhaseOrchestrator;
use super::phase::Phase;
use crate::store::{ProjectId, ProjectStatus};
use std::sync::Weak;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// An automatic continuation. It only runs if the project is still in
/// `expected_status` when the task is picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTask {
    pub project_id: ProjectId,
    pub phase: Phase,
    pub expected_status: ProjectStatus,
    /// Progress floor carried over from the previous phase of the run
    pub floor: u8,
}

#[derive(Debug, Clone)]
pub struct PhaseQueue {
    sender: mpsc::UnboundedSender<PhaseTask>,
}

impl PhaseQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PhaseTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Returns false once the dispatcher has shut down.
    pub fn enqueue(&self, task: PhaseTask) -> bool {
        debug!(project_id = task.project_id, phase = %task.phase, "Queueing phase");
        match self.sender.send(task) {
            Ok(()) => true,
            Err(e) => {
                warn!(project_id = e.0.project_id, phase = %e.0.phase, "Phase queue closed");
                false
            }
        }
    }
}

/// Spawns one task per queued phase. Per-project ordering is enforced by
/// the orchestrator's project locks, not here.
///
/// The loop ends when the orchestrator is dropped.
pub fn spawn_dispatcher(
    orchestrator: Weak<PhaseOrchestrator>,
    mut receiver: mpsc::UnboundedReceiver<PhaseTask>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = receiver.recv().await {
            let Some(orchestrator) = orchestrator.upgrade() else {
                break;
            };
            tokio::spawn(async move {
                orchestrator.run_task(task).await;
            });
        }
        debug!("Phase dispatcher stopped");
    })
}

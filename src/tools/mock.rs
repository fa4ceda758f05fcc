use super::probe::{ToolError, ToolInvocation, ToolOutcome, ToolProbe};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Scripted probe for tests.
///
/// Outcomes are handed out in queue order; once the queue is drained every
/// call reports the tool as unavailable. All invocations are recorded.
pub struct MockToolProbe {
    outcomes: Mutex<VecDeque<Result<ToolOutcome, String>>>,
    calls: Mutex<Vec<ToolInvocation>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockToolProbe {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn add_outcome(&self, outcome: ToolOutcome) {
        lock(&self.outcomes).push_back(Ok(outcome));
    }

    pub fn add_outcomes(&self, outcomes: impl IntoIterator<Item = ToolOutcome>) {
        let mut queue = lock(&self.outcomes);
        for outcome in outcomes {
            queue.push_back(Ok(outcome));
        }
    }

    /// Queues an internal spawn fault.
    pub fn add_fault(&self, message: impl Into<String>) {
        lock(&self.outcomes).push_back(Err(message.into()));
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        lock(&self.calls).clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.command_line()).collect()
    }

    pub fn remaining_outcomes(&self) -> usize {
        lock(&self.outcomes).len()
    }
}

impl Default for MockToolProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProbe for MockToolProbe {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError> {
        lock(&self.calls).push(invocation.clone());
        match lock(&self.outcomes).pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(ToolError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, message),
            }),
            None => Ok(ToolOutcome::Unavailable),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockToolProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockToolProbe")
            .field("remaining_outcomes", &self.remaining_outcomes())
            .field("calls", &lock(&self.calls).len())
            .finish()
    }
}

use super::probe::{ToolError, ToolInvocation, ToolOutcome, ToolProbe};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT_CAP: Duration = Duration::from_secs(180);

/// Runs tools as child processes.
///
/// Children are killed when their timeout elapses. A program that cannot be
/// found or executed counts as unavailable rather than as a fault.
#[derive(Debug, Clone)]
pub struct SystemToolProbe {
    timeout_cap: Duration,
}

impl SystemToolProbe {
    pub fn new() -> Self {
        Self {
            timeout_cap: DEFAULT_TIMEOUT_CAP,
        }
    }

    pub fn with_timeout_cap(timeout_cap: Duration) -> Self {
        Self { timeout_cap }
    }

    pub fn timeout_cap(&self) -> Duration {
        self.timeout_cap
    }
}

impl Default for SystemToolProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProbe for SystemToolProbe {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError> {
        let timeout = invocation.timeout.min(self.timeout_cap);
        let started = Instant::now();
        debug!(tool = %invocation, cwd = %invocation.cwd.display(), ?timeout, "Running tool");

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                debug!(tool = %invocation.program, error = %e, "Tool not available");
                return Ok(ToolOutcome::Unavailable);
            }
            Err(source) => {
                return Err(ToolError::Spawn {
                    program: invocation.program.clone(),
                    source,
                })
            }
        };

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Wait {
                program: invocation.program.clone(),
                source,
            })?,
            Err(_) => {
                warn!(tool = %invocation, timeout_secs = timeout.as_secs(), "Tool timed out");
                return Ok(ToolOutcome::TimedOut);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if output.status.success() {
            info!(tool = %invocation, elapsed_ms, "Tool completed");
            Ok(ToolOutcome::Success { stdout, stderr })
        } else {
            info!(tool = %invocation, code = ?output.status.code(), elapsed_ms, "Tool exited with failure");
            Ok(ToolOutcome::Exited {
                code: output.status.code(),
                stderr,
            })
        }
    }

    fn name(&self) -> &str {
        "system"
    }
}

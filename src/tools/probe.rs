use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A single external tool call with its own time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: &[&str], cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Result of a tool run that did not hit an internal fault.
///
/// Everything except `Success` is a soft outcome: it is logged and the
/// calling step carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success { stdout: String, stderr: String },
    Exited { code: Option<i32>, stderr: String },
    Unavailable,
    TimedOut,
}

impl ToolOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        ToolOutcome::Success {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// First non-empty line of the tool's output. `java -version` writes to
    /// stderr, so both streams are checked.
    pub fn first_line(&self) -> Option<&str> {
        match self {
            ToolOutcome::Success { stdout, stderr } => stdout
                .lines()
                .chain(stderr.lines())
                .map(str::trim)
                .find(|l| !l.is_empty()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolOutcome::Success { .. } => "success",
            ToolOutcome::Exited { .. } => "exited",
            ToolOutcome::Unavailable => "unavailable",
            ToolOutcome::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutcome::Success { .. } => write!(f, "completed"),
            ToolOutcome::Exited { code: Some(code), .. } => write!(f, "exited with code {}", code),
            ToolOutcome::Exited { code: None, .. } => write!(f, "terminated by signal"),
            ToolOutcome::Unavailable => write!(f, "not installed"),
            ToolOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Internal faults while running a tool. These fail the calling step.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ToolProbe: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError>;

    fn name(&self) -> &str;
}

/// Probe that reports every tool as absent. Used when tool execution is
/// switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineToolProbe;

#[async_trait]
impl ToolProbe for OfflineToolProbe {
    async fn run(&self, _invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::Unavailable)
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let inv = ToolInvocation::new("flutter", &["build", "apk", "--release"], "/tmp").timeout_secs(60);
        assert_eq!(inv.command_line(), "flutter build apk --release");
        assert_eq!(inv.timeout, Duration::from_secs(60));
        assert_eq!(ToolInvocation::new("java", &[], "/tmp").to_string(), "java");
    }

    #[test]
    fn test_first_line_reads_stderr() {
        let outcome = ToolOutcome::Success {
            stdout: String::new(),
            stderr: "\nopenjdk version \"17.0.2\"\nOpenJDK Runtime".to_string(),
        };
        assert_eq!(outcome.first_line(), Some("openjdk version \"17.0.2\""));
        assert_eq!(ToolOutcome::TimedOut.first_line(), None);
    }

    #[test]
    fn test_outcome_display() {
        let exited = ToolOutcome::Exited {
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(exited.to_string(), "exited with code 2");
        assert_eq!(ToolOutcome::Unavailable.to_string(), "not installed");
        assert!(!exited.is_success());
    }

    #[tokio::test]
    async fn test_offline_probe() {
        let probe = OfflineToolProbe;
        let outcome = probe
            .run(&ToolInvocation::new("npm", &["install"], "/tmp"))
            .await
            .unwrap();
        assert_eq!(outcome, ToolOutcome::Unavailable);
    }
}

use crate::detection::ProjectAnalysis;
use crate::stack::FrameworkId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ProjectId = u64;

/// Lifecycle of a project. `Completed` and `Error` are terminal for
/// automatic continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Uploaded,
    Extracted,
    Analyzing,
    Analyzed,
    Setup,
    SetupComplete,
    Building,
    Completed,
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Uploaded => "uploaded",
            ProjectStatus::Extracted => "extracted",
            ProjectStatus::Analyzing => "analyzing",
            ProjectStatus::Analyzed => "analyzed",
            ProjectStatus::Setup => "setup",
            ProjectStatus::SetupComplete => "setup-complete",
            ProjectStatus::Building => "building",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Error)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub original_file_name: String,
    pub file_size: u64,
    pub framework: Option<FrameworkId>,
    pub status: ProjectStatus,
    pub progress: u8,
    pub analysis: Option<ProjectAnalysis>,
    pub apk_path: Option<String>,
    pub apk_size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn has_artifact(&self) -> bool {
        self.apk_path.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub original_file_name: String,
    pub file_size: u64,
}

impl NewProject {
    /// Derives the display name by dropping a trailing `.zip`.
    pub fn from_upload(original_file_name: &str, file_size: u64) -> Self {
        let name = original_file_name
            .strip_suffix(".zip")
            .or_else(|| original_file_name.strip_suffix(".ZIP"))
            .unwrap_or(original_file_name)
            .to_string();
        Self {
            name,
            original_file_name: original_file_name.to_string(),
            file_size,
        }
    }
}

/// Merge update: only the fields that are set are written.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub status: Option<ProjectStatus>,
    pub progress: Option<u8>,
    pub framework: Option<FrameworkId>,
    pub analysis: Option<ProjectAnalysis>,
    pub apk_path: Option<String>,
    pub apk_size: Option<u64>,
    /// Drops any stored artifact before `apk_path`/`apk_size` are applied.
    pub clears_artifact: bool,
}

impl ProjectUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    /// Sets the analysis and the framework it detected.
    pub fn analysis(mut self, analysis: ProjectAnalysis) -> Self {
        self.framework = Some(analysis.framework.clone());
        self.analysis = Some(analysis);
        self
    }

    pub fn artifact(mut self, path: impl Into<String>, size: u64) -> Self {
        self.apk_path = Some(path.into());
        self.apk_size = Some(size);
        self
    }

    pub fn clear_artifact(mut self) -> Self {
        self.clears_artifact = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.framework.is_none()
            && self.analysis.is_none()
            && self.apk_path.is_none()
            && self.apk_size.is_none()
            && !self.clears_artifact
    }

    pub(crate) fn apply_to(self, project: &mut Project) {
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(progress) = self.progress {
            project.progress = progress;
        }
        if let Some(framework) = self.framework {
            project.framework = Some(framework);
        }
        if let Some(analysis) = self.analysis {
            project.analysis = Some(analysis);
        }
        if self.clears_artifact {
            project.apk_path = None;
            project.apk_size = None;
        }
        if let Some(apk_path) = self.apk_path {
            project.apk_path = Some(apk_path);
        }
        if let Some(apk_size) = self.apk_size {
            project.apk_size = Some(apk_size);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildLogEntry {
    pub id: u64,
    pub project_id: ProjectId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

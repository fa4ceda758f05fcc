use crate::detection::AnalysisError;
use crate::fs::FileStoreError;
use crate::store::{ProjectId, StoreError};
use crate::tools::ToolError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("Project must be analyzed first")]
    NotAnalyzed,

    #[error("Unsupported framework: {0}")]
    UnsupportedFramework(String),

    /// A setup step hit an internal fault; `errors` holds every failure the
    /// step collected before giving up.
    #[error("{step} failed")]
    StepFailed { step: String, errors: Vec<String> },

    #[error("Failed to extract archive for project {project_id}: {source}")]
    Extraction {
        project_id: ProjectId,
        #[source]
        source: FileStoreError,
    },

    #[error("Artifact verification failed: {0}")]
    ArtifactInvalid(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Files(#[from] FileStoreError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PhaseError {
    /// Messages suitable for an API `details` list.
    pub fn details(&self) -> Vec<String> {
        match self {
            PhaseError::StepFailed { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("Failed to write archive entry: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fallback artifact could not be written after '{primary}': {source}")]
    FallbackFailed {
        primary: String,
        #[source]
        source: Box<PackagingError>,
    },

    #[error("Packaging task failed: {0}")]
    Task(String),
}

impl PackagingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackagingError::Io {
            path: path.into(),
            source,
        }
    }
}

//! Response bodies

use crate::detection::ProjectAnalysis;
use crate::pipeline::{BuildReport, SetupDetails};
use crate::store::Project;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub project: Project,
    pub message: &'static str,
    pub next_step: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: ProjectAnalysis,
}

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: &'static str,
    pub details: SetupDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub build_result: BuildReport,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            deleted: None,
        }
    }

    pub fn with_message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            ..Self::ok()
        }
    }

    pub fn deleted(deleted: bool) -> Self {
        Self {
            deleted: Some(deleted),
            ..Self::ok()
        }
    }
}

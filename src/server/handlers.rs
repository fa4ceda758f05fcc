use super::error::{phase_error, ApiError};
use super::models::{
    AnalyzeResponse, BuildResponse, HealthResponse, SetupResponse, SuccessResponse, UploadResponse,
};
use super::validation::{UploadValidator, ValidationReport};
use super::AppState;
use crate::store::{BuildLogEntry, Project, ProjectId};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use tracing::{debug, info};

const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

/// The `file` part of a multipart request.
struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedFile {
            name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

pub async fn validate_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(file) = read_file_field(&mut multipart).await? else {
        return Ok((StatusCode::BAD_REQUEST, Json(ValidationReport::missing_file())).into_response());
    };
    debug!(file = %file.name, size = file.bytes.len(), "Validating upload");

    let report = UploadValidator::new(state.max_upload_bytes).validate(
        &file.name,
        file.content_type.as_deref(),
        &file.bytes,
    );
    Ok(Json(report).into_response())
}

pub async fn upload_project(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or(ApiError::NoFile)?;
    info!(file = %file.name, size = file.bytes.len(), "Upload request received");

    let report = UploadValidator::new(state.max_upload_bytes).validate(
        &file.name,
        file.content_type.as_deref(),
        &file.bytes,
    );
    if !report.is_valid {
        return Err(ApiError::Validation(report.errors));
    }

    let project = state
        .orchestrator
        .handle_upload(&file.name, &file.bytes)
        .await
        .map_err(|e| phase_error("Failed to upload file", e))?;

    Ok(Json(UploadResponse {
        project,
        message: "File uploaded and extracted successfully - automatic processing started",
        next_step: "automatic_analysis",
    }))
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .orchestrator
        .context()
        .store
        .list_projects()
        .await
        .map_err(|e| ApiError::internal("Failed to get projects", e))?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<Project>, ApiError> {
    state
        .orchestrator
        .context()
        .store
        .get_project(id)
        .await
        .map_err(|e| ApiError::internal("Failed to get project", e))?
        .map(Json)
        .ok_or(ApiError::NotFound("Project not found"))
}

pub async fn analyze_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let analysis = state
        .orchestrator
        .analyze(id)
        .await
        .map_err(|e| phase_error("Analysis failed", e))?;
    Ok(Json(AnalyzeResponse { analysis }))
}

pub async fn setup_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<SetupResponse>, ApiError> {
    let report = state
        .orchestrator
        .setup(id)
        .await
        .map_err(|e| phase_error("Setup failed", e))?;
    Ok(Json(SetupResponse {
        success: true,
        message: "Project setup completed successfully",
        details: report.details,
    }))
}

pub async fn build_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<BuildResponse>, ApiError> {
    let build_result = state
        .orchestrator
        .build(id)
        .await
        .map_err(|e| phase_error("Build failed", e))?;
    Ok(Json(BuildResponse { build_result }))
}

pub async fn stop_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .orchestrator
        .request_stop(id)
        .await
        .map_err(|e| phase_error("Failed to stop project", e))?;
    Ok(Json(SuccessResponse::with_message(
        "Automatic processing will stop after the current phase",
    )))
}

pub async fn download_artifact(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Response, ApiError> {
    let context = state.orchestrator.context();
    let project = context
        .store
        .get_project(id)
        .await
        .map_err(|e| ApiError::internal("Download failed", e))?;
    let Some((name, apk_path)) = project.and_then(|p| p.apk_path.map(|path| (p.name, path))) else {
        return Err(ApiError::NotFound("APK not found"));
    };

    let bytes = context
        .files
        .read_bytes(std::path::Path::new(&apk_path))
        .await
        .map_err(|_| ApiError::NotFound("APK not found"))?;

    let disposition = format!(
        "attachment; filename=\"{}-release.apk\"",
        attachment_name(&name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, APK_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Project name made safe for a quoted `filename` parameter.
fn attachment_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' ' => ' ',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect()
}

pub async fn get_logs(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<Vec<BuildLogEntry>>, ApiError> {
    let logs = state
        .orchestrator
        .context()
        .store
        .list_logs(id)
        .await
        .map_err(|e| ApiError::internal("Failed to get logs", e))?;
    Ok(Json(logs))
}

pub async fn clear_logs(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .orchestrator
        .context()
        .store
        .clear_logs(id)
        .await
        .map_err(|e| ApiError::internal("Failed to clear logs", e))?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let deleted = state
        .orchestrator
        .delete_project(id)
        .await
        .map_err(|e| phase_error("Failed to delete project", e))?;
    Ok(Json(SuccessResponse::deleted(deleted)))
}

//! Process API handlers
//!
//! CRUD and export endpoints under `/api/processes`.

use axum::{
    extract::{FromRequest, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use bpmn_registry_store::Process;

use crate::api::errors::ApiError;
use crate::service::{NewProcess, ProcessPatch, RegistryService};

/// JSON body extractor whose rejections use the API error body
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Acknowledgement body for delete
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Handler for listing processes
pub async fn list_processes_handler(
    State(service): State<Arc<RegistryService>>,
) -> Result<Json<Vec<Process>>, ApiError> {
    service
        .list()
        .await
        .map(Json)
        .map_err(|err| ApiError::from_registry(err, "Failed to fetch processes"))
}

/// Handler for getting a process by ID
pub async fn get_process_handler(
    State(service): State<Arc<RegistryService>>,
    Path(process_id): Path<String>,
) -> Result<Json<Process>, ApiError> {
    service
        .get(&process_id)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_registry(err, "Failed to fetch process"))
}

/// Handler for creating a process
pub async fn create_process_handler(
    State(service): State<Arc<RegistryService>>,
    ApiJson(input): ApiJson<NewProcess>,
) -> Result<Json<Process>, ApiError> {
    service
        .create(input)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_registry(err, "Failed to create process"))
}

/// Handler for updating a process
pub async fn update_process_handler(
    State(service): State<Arc<RegistryService>>,
    Path(process_id): Path<String>,
    ApiJson(patch): ApiJson<ProcessPatch>,
) -> Result<Json<Process>, ApiError> {
    service
        .update(&process_id, patch)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_registry(err, "Failed to update process"))
}

/// Handler for deleting a process
pub async fn delete_process_handler(
    State(service): State<Arc<RegistryService>>,
    Path(process_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    service
        .delete(&process_id)
        .await
        .map_err(|err| ApiError::from_registry(err, "Failed to delete process"))?;

    Ok(Json(MessageResponse {
        message: "Process deleted successfully".to_string(),
    }))
}

/// Handler for exporting the BPMN XML of a process as a file download
pub async fn export_process_handler(
    State(service): State<Arc<RegistryService>>,
    Path(process_id): Path<String>,
) -> Result<Response, ApiError> {
    let export = service
        .export(&process_id)
        .await
        .map_err(|err| ApiError::from_registry(err, "Failed to export process"))?;

    info!(%process_id, filename = %export.filename, "Exporting process BPMN");

    let disposition = attachment_disposition(&export.filename)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/xml")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}

/// Builds `attachment; filename={filename}` with the name as stored.
///
/// Control characters cannot appear in a header value and are replaced
/// with `_`; everything else is passed through unquoted.
pub fn attachment_disposition(filename: &str) -> Result<HeaderValue, ApiError> {
    let filename: String = filename
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename={}", filename))
        .map_err(|_| ApiError::InternalServerError("Failed to export process".to_string()))
}

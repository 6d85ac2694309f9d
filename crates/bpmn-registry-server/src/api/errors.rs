//! Error handling for the Registry API
//!
//! This module maps registry outcomes to HTTP responses. Store faults are
//! logged here with full detail and answered with a generic message only.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::service::RegistryError;

pub const PROCESS_NOT_FOUND: &str = "Process not found";
pub const NO_BPMN_XML: &str = "No BPMN XML found for this process";

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Not found (404)
    NotFound(String),
    /// Record exists but has nothing to export (404, distinct code)
    NoContent(String),
    /// Body is not valid JSON (400)
    BadRequest(String),
    /// Body is not declared as JSON (415)
    UnsupportedMediaType(String),
    /// Unprocessable entity (422)
    Unprocessable(String),
    /// Internal server error (500)
    InternalServerError(String),
}

impl ApiError {
    /// Convert a registry error, using `fault_message` if the store failed.
    pub fn from_registry(err: RegistryError, fault_message: &'static str) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::NotFound(PROCESS_NOT_FOUND.to_string()),
            RegistryError::NoContent(_) => ApiError::NoContent(NO_BPMN_XML.to_string()),
            RegistryError::Validation(msg) => ApiError::Unprocessable(msg),
            RegistryError::Store(store_err) => {
                error!(error = %store_err, detail = ?store_err, "{}", fault_message);
                ApiError::InternalServerError(fault_message.to_string())
            }
        }
    }

    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND"),
            ApiError::NoContent(_) => (StatusCode::NOT_FOUND, "ERR_NO_CONTENT"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST"),
            ApiError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "ERR_UNSUPPORTED_MEDIA_TYPE")
            }
            ApiError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ERR_VALIDATION_ERROR"),
            ApiError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL_SERVER_ERROR")
            }
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::NoContent(msg)
            | ApiError::BadRequest(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::Unprocessable(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => ApiError::Unprocessable(message),
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (status, _) = self.status_and_code();
        write!(f, "{}: {}", status, self.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = self.message();

        let body = Json(json!({
            "detail": message,
            "errorDetails": {
                "errorCode": error_code,
                "errorMessage": message,
            }
        }));

        (status, body).into_response()
    }
}

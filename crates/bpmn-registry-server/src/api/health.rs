//! Health check endpoint for the BPMN Registry Server

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::service::RegistryService;

/// Health check handler
///
/// Reports `UP` when the process store answers, `DOWN` with a 503 otherwise.
pub async fn health_check(State(service): State<Arc<RegistryService>>) -> impl IntoResponse {
    debug!("Health check requested");

    let store_status = match service.health().await {
        Ok(true) => "UP",
        Ok(false) => "DOWN",
        Err(err) => {
            warn!(error = %err, "Process store health check failed");
            "DOWN"
        }
    };

    let status_code = if store_status == "UP" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": store_status,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "processStore": { "status": store_status },
        },
    });

    (status_code, Json(response))
}

/// API root handler
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "BPMN Flow Editor API" }))
}

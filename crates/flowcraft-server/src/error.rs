//! ABOUTME: Maps FlowError onto the stable HTTP status/body contract —
//! ABOUTME: one IntoResponse impl, no handler branches on error variants itself

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowcraft_core::error::FlowError;
use serde_json::json;

pub struct ApiError(FlowError);

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let phase = self.0.phase();
        let status = match &self.0 {
            FlowError::BadInput { .. } => StatusCode::BAD_REQUEST,
            FlowError::Unauthorized { .. } | FlowError::MissingCredential { .. } => StatusCode::UNAUTHORIZED,
            FlowError::NotFound { .. } => StatusCode::NOT_FOUND,
            FlowError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::CatalogUnavailable { .. } | FlowError::Agent { .. } | FlowError::Dispatch { .. } => {
                StatusCode::BAD_GATEWAY
            }
            FlowError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "error": self.0.to_string(), "phase": phase });
        if let FlowError::Validation { issues } = &self.0 {
            body["validation_errors"] = json!(issues);
        }

        (status, Json(body)).into_response()
    }
}

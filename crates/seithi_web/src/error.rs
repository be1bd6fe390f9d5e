use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seithi_core::Error;
use serde_json::json;

/// Maps the core error taxonomy onto HTTP status codes.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store errors are logged in full but not echoed to clients.
        let message = if status.is_server_error() {
            tracing::error!("❌ {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

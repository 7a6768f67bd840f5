pub mod games;
pub mod handlers;
pub mod import;
pub mod middleware;
pub mod profiles;
pub mod routes;

pub use routes::create_router;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use gamedex_core::SyncError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<SyncError> for ErrorResponse {
    fn from(e: SyncError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

/// Map a sync error to its HTTP status.
pub fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::NotFound(_) => StatusCode::NOT_FOUND,
        SyncError::Validation(_) => StatusCode::BAD_REQUEST,
        SyncError::ImportInProgress => StatusCode::CONFLICT,
        SyncError::RemoteUnavailable(_) => StatusCode::BAD_GATEWAY,
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::from(e)))
}

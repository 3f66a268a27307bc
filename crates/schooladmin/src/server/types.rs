use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::ApiError;
use crate::timetable::SlotError;

/// JSON error body returned by every endpoint.
#[derive(Debug)]
pub struct ApiErrorType {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            details,
        }
    }
}

impl From<ApiError> for ApiErrorType {
    fn from(err: ApiError) -> Self {
        let (status, message) = match &err {
            ApiError::Unauthorized { .. } => {
                (StatusCode::UNAUTHORIZED, "Not authorized by the school API")
            }
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::CircuitBreakerOpen => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable due to repeated failures",
            ),
            _ => (StatusCode::BAD_GATEWAY, "School API request failed"),
        };
        (status, message, Some(err.to_string())).into()
    }
}

impl From<SlotError> for ApiErrorType {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NotLoaded => (StatusCode::CONFLICT, "Timetable still loading", None).into(),
            _ => (
                StatusCode::BAD_REQUEST,
                "Invalid slot edit",
                Some(err.to_string()),
            )
                .into(),
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.error,
                "details": self.details,
            })),
        )
            .into_response()
    }
}

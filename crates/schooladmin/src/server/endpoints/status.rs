use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "sessions": s.sessions.len(),
            "directory_cache": s.api.cache_stats(),
        })),
    )
        .into_response()
}

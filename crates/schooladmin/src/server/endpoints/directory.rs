//! Class and teacher directories of a school.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::server::types::ApiErrorType;
use crate::server::util::BearerToken;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolQuery {
    pub school_id: Option<String>,
}

impl SchoolQuery {
    /// The requested school, or the configured default.
    fn resolve(self, s: &AppState) -> Result<String, ApiErrorType> {
        resolve_school(self.school_id, s)
    }
}

/// Picks the school named by the request, falling back to the configured default.
pub(crate) fn resolve_school(
    requested: Option<String>,
    s: &AppState,
) -> Result<String, ApiErrorType> {
    requested
        .filter(|id| !id.trim().is_empty())
        .or_else(|| s.config.server.default_school_id.clone())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "schoolId is required", None).into())
}

/// GET /classes?schoolId=
pub async fn get_classes(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<SchoolQuery>,
) -> Result<Response, ApiErrorType> {
    let school_id = query.resolve(&s)?;
    info!("GET /classes (school={})", school_id);

    match s.api.list_classes(token.as_str(), &school_id).await {
        Ok(classes) => Ok((StatusCode::OK, Json(classes)).into_response()),
        Err(e) => {
            error!("Failed to fetch classes: {}", e);
            Err(e.into())
        }
    }
}

/// GET /teachers?schoolId=
pub async fn get_teachers(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<SchoolQuery>,
) -> Result<Response, ApiErrorType> {
    let school_id = query.resolve(&s)?;
    info!("GET /teachers (school={})", school_id);

    match s.api.list_teachers(token.as_str(), &school_id).await {
        Ok(teachers) => Ok((StatusCode::OK, Json(teachers)).into_response()),
        Err(e) => {
            error!("Failed to fetch teachers: {}", e);
            Err(e.into())
        }
    }
}

/// POST /directory/refresh?schoolId=
///
/// Drops the cached directories so the next request refetches them.
pub async fn post_refresh(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<SchoolQuery>,
) -> Result<Response, ApiErrorType> {
    let school_id = query.resolve(&s)?;
    info!("POST /directory/refresh (school={})", school_id);

    s.api.invalidate_directory(token.as_str(), &school_id);
    Ok((StatusCode::OK, Json(json!({ "message": "Directory cache invalidated" }))).into_response())
}

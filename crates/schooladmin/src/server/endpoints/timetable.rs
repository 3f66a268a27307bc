//! Endpoints for editing the timetable of one class.
//!
//! Each bearer token owns one editing session. Network calls run without the
//! session lock held; their results are applied only if the session still has
//! the class selected that the call was started for.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::server::endpoints::directory::resolve_school;
use crate::server::types::ApiErrorType;
use crate::server::util::BearerToken;
use crate::timetable::{self, Day, LoadedTimetable, SlotField};
use crate::types::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectClassBody {
    pub class_id: String,
    #[serde(default)]
    pub school_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotEditBody {
    pub day: String,
    pub period: usize,
    pub field: String,
    #[serde(default)]
    pub value: String,
}

fn no_class_selected() -> ApiErrorType {
    (
        StatusCode::CONFLICT,
        "No class selected",
        Some("POST /timetable/select first".to_string()),
    )
        .into()
}

/// GET /timetable
///
/// Returns the grid, period times, subject choices and conflicts of the
/// caller's session.
pub async fn get_timetable(State(s): State<Arc<AppState>>, token: BearerToken) -> Response {
    let session = s.session(&token.session_key());
    let view = session.lock().await.view();
    (StatusCode::OK, Json(view)).into_response()
}

/// DELETE /timetable
///
/// Discards the caller's session without saving.
pub async fn delete_session(State(s): State<Arc<AppState>>, token: BearerToken) -> Response {
    let removed = s.end_session(&token.session_key());
    info!("DELETE /timetable (had_session={})", removed);
    StatusCode::NO_CONTENT.into_response()
}

/// POST /timetable/select
///
/// Drops the current grid and conflicts and loads the timetable of another
/// class. A failed timetable read yields an empty grid.
pub async fn post_select(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
    Json(body): Json<SelectClassBody>,
) -> Result<Response, ApiErrorType> {
    let school_id = resolve_school(body.school_id, &s)?;
    let class_id = body.class_id.trim().to_string();
    if class_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "classId is required", None).into());
    }
    info!("POST /timetable/select (class={}, school={})", class_id, school_id);

    let session = s.session(&token.session_key());
    let ticket = session.lock().await.begin_selection(&class_id, &school_id);

    let store = s.api.authorized(token.as_str());
    let (records, teachers, subjects) = tokio::join!(
        timetable::load_records(&store, &class_id, &school_id),
        s.api.list_teachers(token.as_str(), &school_id),
        s.api.class_subjects(token.as_str(), &school_id, &class_id),
    );

    let teachers = teachers.unwrap_or_else(|e| {
        warn!(
            school_id = %school_id,
            error = %e,
            "Teacher directory unavailable, conflict messages disabled"
        );
        Vec::new()
    });
    let subjects = subjects.unwrap_or_else(|e| {
        warn!(class_id = %class_id, error = %e, "Subject list unavailable");
        Vec::new()
    });

    let mut guard = session.lock().await;
    let applied = guard.apply_selection(
        &ticket,
        LoadedTimetable {
            records,
            teachers,
            subjects,
        },
    );
    if !applied {
        return Err((
            StatusCode::CONFLICT,
            "Class selection changed while loading",
            guard.class_id().map(|c| format!("now editing {c}")),
        )
            .into());
    }

    Ok((StatusCode::OK, Json(guard.view())).into_response())
}

/// PATCH /timetable/slot
///
/// Sets the subject or teacher of one slot. Assigning a teacher may add a
/// conflict message; the edit is applied regardless. Edits are refused with
/// 409 while the selected class is still loading.
pub async fn patch_slot(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
    Json(body): Json<SlotEditBody>,
) -> Result<Response, ApiErrorType> {
    let day: Day = body.day.parse()?;
    let field: SlotField = body.field.parse()?;

    let session = s.session(&token.session_key());
    let mut guard = session.lock().await;
    if guard.class_id().is_none() {
        return Err(no_class_selected());
    }

    let slot = guard
        .set_slot_field(day, body.period, field, body.value.trim())?
        .clone();

    Ok((
        StatusCode::OK,
        Json(json!({
            "day": day,
            "period": body.period,
            "slot": slot,
            "conflicts": guard.conflicts(),
        })),
    )
        .into_response())
}

/// POST /timetable/save
///
/// Writes one record per day, in day order. Stops at the first failed day;
/// the response lists which days were saved, which failed and which were skipped.
/// Refused with 409 while the selected class is still loading.
pub async fn post_save(
    State(s): State<Arc<AppState>>,
    token: BearerToken,
) -> Result<Response, ApiErrorType> {
    let session = s.session(&token.session_key());
    let ticket = {
        let guard = session.lock().await;
        if guard.class_id().is_none() {
            return Err(no_class_selected());
        }
        guard.prepare_save().ok_or_else(|| {
            ApiErrorType::from((StatusCode::CONFLICT, "Timetable still loading", None))
        })?
    };
    info!(
        "POST /timetable/save (class={}, days={})",
        ticket.class_id,
        ticket.records.len()
    );

    let store = s.api.authorized(token.as_str());
    let report = timetable::save_records(&store, &ticket.records).await;

    let current = session.lock().await.finish_save(&ticket, &report);
    if !current {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Class selection changed while saving",
                "report": report,
            })),
        )
            .into_response());
    }

    if report.is_complete() {
        Ok((StatusCode::OK, Json(json!({ "report": report }))).into_response())
    } else {
        Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Failed to save timetable",
                "report": report,
            })),
        )
            .into_response())
    }
}

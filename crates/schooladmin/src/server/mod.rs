use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::server::endpoints::{directory, status, timetable};
use crate::types::AppState;

mod endpoints;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Editing session of the caller, keyed by bearer token
    let timetable_router = Router::new()
        .route(
            "/timetable",
            get(timetable::get_timetable).delete(timetable::delete_session),
        )
        .route("/timetable/select", post(timetable::post_select))
        .route("/timetable/slot", patch(timetable::patch_slot))
        .route("/timetable/save", post(timetable::post_save));

    // Pass-through to the remote directories, cached
    let directory_router = Router::new()
        .route("/classes", get(directory::get_classes))
        .route("/teachers", get(directory::get_teachers))
        .route("/directory/refresh", post(directory::post_refresh));

    Router::new()
        .route("/health", get(status::get_health))
        .merge(timetable_router)
        .merge(directory_router)
        .with_state(app_state)
}

//! In-process stand-in for the remote school REST API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use schooladmin::api::ClassInfo;
use schooladmin::config::{ApiConfig, DashboardConfig};
use schooladmin::server::create_router;
use schooladmin::timetable::{PeriodEntry, Teacher, TimetableRecord};
use schooladmin::types::AppState;

pub const TOKEN: &str = "test-token";
pub const SCHOOL: &str = "S1";

#[derive(Default)]
pub struct FakeApi {
    pub records: Mutex<Vec<TimetableRecord>>,
    pub teachers: Vec<Teacher>,
    pub classes: Vec<ClassInfo>,
    /// Upserts for this day answer 500
    pub fail_upsert_day: Mutex<Option<String>>,
    /// Number of upcoming timetable reads that answer 500
    pub read_failures: AtomicUsize,
    pub teacher_requests: AtomicUsize,
    pub timetable_reads: AtomicUsize,
    /// Upsert requests received, including ones still being delayed
    pub upsert_requests: AtomicUsize,
    /// Days in the order upserts were stored
    pub upserts: Mutex<Vec<String>>,
    /// Added latency for timetable reads, in milliseconds
    pub read_delay_ms: AtomicU64,
    /// Added latency for each upsert, in milliseconds
    pub upsert_delay_ms: AtomicU64,
}

impl FakeApi {
    /// Two teachers, one class with subjects, and a Monday record for C1.
    pub fn seeded() -> Self {
        Self {
            records: Mutex::new(vec![TimetableRecord {
                id: Some("r-mon".into()),
                class_id: "C1".into(),
                day: "Monday".into(),
                school_id: SCHOOL.into(),
                periods: vec![
                    PeriodEntry {
                        start_time: "08:00".into(),
                        end_time: "08:45".into(),
                        subject: "Math".into(),
                        teacher_id: Some("T1".into()),
                    },
                    PeriodEntry::default(),
                    PeriodEntry {
                        start_time: "09:30".into(),
                        end_time: "10:15".into(),
                        subject: "Art".into(),
                        teacher_id: Some("T2".into()),
                    },
                ],
            }]),
            teachers: vec![
                Teacher {
                    id: "T1".into(),
                    name: "Ada Lovelace".into(),
                },
                Teacher {
                    id: "T2".into(),
                    name: "Grace Hopper".into(),
                },
            ],
            classes: vec![
                ClassInfo {
                    id: "C1".into(),
                    name: "7A".into(),
                    school_id: Some(SCHOOL.into()),
                    subjects: vec!["Math".into(), "Art".into(), "English".into()],
                },
                ClassInfo {
                    id: "C2".into(),
                    name: "7B".into(),
                    school_id: Some(SCHOOL.into()),
                    subjects: vec!["Music".into()],
                },
            ],
            ..Default::default()
        }
    }

    pub fn stored_for(&self, class_id: &str) -> Vec<TimetableRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.class_id == class_id)
            .cloned()
            .collect()
    }
}

type Shared = Arc<FakeApi>;

async fn delay(ms: &AtomicU64) {
    let ms = ms.load(Ordering::SeqCst);
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Polls `counter` until it reaches `target`.
pub async fn wait_for(counter: &AtomicUsize, target: usize) {
    for _ in 0..500 {
        if counter.load(Ordering::SeqCst) >= target {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("counter never reached {target}");
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    let body = Json(json!({ "message": "invalid token" }));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

async fn get_teachers(State(api): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    api.teacher_requests.fetch_add(1, Ordering::SeqCst);
    // Wrapped in `data`, as some list endpoints do
    Json(json!({ "data": api.teachers })).into_response()
}

async fn get_classes(State(api): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!(api.classes)).into_response()
}

async fn get_timetables(
    State(api): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    api.timetable_reads.fetch_add(1, Ordering::SeqCst);
    delay(&api.read_delay_ms).await;

    let failing = api
        .read_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }

    let class_id = query.get("classId").cloned().unwrap_or_default();
    if class_id == "unknown-class" {
        return (StatusCode::NOT_FOUND, "no such class").into_response();
    }

    Json(json!(api.stored_for(&class_id))).into_response()
}

async fn post_timetable(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(record): Json<TimetableRecord>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    api.upsert_requests.fetch_add(1, Ordering::SeqCst);
    delay(&api.upsert_delay_ms).await;

    let fail_day = api.fail_upsert_day.lock().unwrap().clone();
    if fail_day.as_deref() == Some(record.day.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "write failed").into_response();
    }

    api.upserts.lock().unwrap().push(record.day.clone());
    let mut records = api.records.lock().unwrap();
    records.retain(|r| !(r.class_id == record.class_id && r.day == record.day));
    records.push(record.clone());
    (StatusCode::OK, Json(record)).into_response()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serves `api` on an ephemeral port; returns the API base URL.
pub async fn spawn_fake_api(api: Shared) -> String {
    let routes = Router::new()
        .route("/teachers", get(get_teachers))
        .route("/classes", get(get_classes))
        .route("/timetables", get(get_timetables).post(post_timetable))
        .with_state(api);

    let root = serve(Router::new().nest("/api", routes)).await;
    format!("{root}/api")
}

/// Client settings suited to tests: no retry delay, breaker disabled.
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        max_retries: 0,
        retry_base_ms: 1,
        breaker_threshold: 0,
        ..ApiConfig::default()
    }
}

/// Starts the editor service against `base_url`; returns its root URL.
pub async fn spawn_editor(base_url: &str, default_school: Option<&str>) -> String {
    let mut config = DashboardConfig::default();
    config.api = api_config(base_url);
    config.server.default_school_id = default_school.map(str::to_string);

    let state = Arc::new(AppState::new(config).unwrap());
    serve(create_router(state)).await
}

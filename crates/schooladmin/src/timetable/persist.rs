//! Loading and saving a class timetable through the remote store.

use super::types::TimetableRecord;
use crate::api::ApiError;
use serde::Serialize;
use std::future::Future;
use tracing::{info, warn};

/// Read/write access to persisted per-day timetable records.
pub trait TimetableStore {
    /// Returns every stored record of one class.
    fn fetch_timetable(
        &self,
        class_id: &str,
        school_id: &str,
    ) -> impl Future<Output = Result<Vec<TimetableRecord>, ApiError>> + Send;

    /// Creates or replaces the record for `(record.class_id, record.day)`.
    fn upsert_timetable(
        &self,
        record: &TimetableRecord,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Outcome of one day within a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveStatus {
    Saved,
    Failed { reason: String },
    /// Not attempted because an earlier day failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOutcome {
    pub day: String,
    #[serde(flatten)]
    pub status: SaveStatus,
}

/// Per-day result of saving a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub outcomes: Vec<DayOutcome>,
}

impl SaveReport {
    /// True when every day was written.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o.status, SaveStatus::Saved))
    }

    /// The day whose write failed, if any.
    pub fn failed_day(&self) -> Option<&DayOutcome> {
        self.outcomes
            .iter()
            .find(|o| matches!(o.status, SaveStatus::Failed { .. }))
    }

    pub fn saved_days(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SaveStatus::Saved))
            .map(|o| o.day.as_str())
    }
}

/// Fetches the stored records of a class. A failed read counts as "no records".
pub async fn load_records<S: TimetableStore>(
    store: &S,
    class_id: &str,
    school_id: &str,
) -> Vec<TimetableRecord> {
    match store.fetch_timetable(class_id, school_id).await {
        Ok(records) => {
            info!(class_id, school_id, records = records.len(), "Loaded timetable");
            records
        }
        Err(e) => {
            warn!(
                class_id,
                school_id,
                error = %e,
                "Failed to load timetable, starting from an empty grid"
            );
            Vec::new()
        }
    }
}

/// Writes `records` one at a time, in order.
///
/// The first failure stops the save: later days are reported as skipped and
/// days already written stay written.
pub async fn save_records<S: TimetableStore>(store: &S, records: &[TimetableRecord]) -> SaveReport {
    let mut report = SaveReport::default();
    let mut failed = false;

    for record in records {
        if failed {
            report.outcomes.push(DayOutcome {
                day: record.day.clone(),
                status: SaveStatus::Skipped,
            });
            continue;
        }

        let status = match store.upsert_timetable(record).await {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                warn!(
                    class_id = %record.class_id,
                    day = %record.day,
                    error = %e,
                    "Timetable save failed, remaining days not written"
                );
                failed = true;
                SaveStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        report.outcomes.push(DayOutcome {
            day: record.day.clone(),
            status,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<TimetableRecord>>,
        fail_day: Option<String>,
        fail_reads: bool,
    }

    impl TimetableStore for MemoryStore {
        async fn fetch_timetable(
            &self,
            class_id: &str,
            _school_id: &str,
        ) -> Result<Vec<TimetableRecord>, ApiError> {
            if self.fail_reads {
                return Err(ApiError::Network {
                    message: "connection refused".into(),
                });
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| r.class_id == class_id)
                .cloned()
                .collect())
        }

        async fn upsert_timetable(&self, record: &TimetableRecord) -> Result<(), ApiError> {
            if self.fail_day.as_deref() == Some(record.day.as_str()) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".into(),
                });
            }
            let mut records = self.records.lock().unwrap();
            records.retain(|r| !(r.class_id == record.class_id && r.day == record.day));
            records.push(record.clone());
            Ok(())
        }
    }

    fn record(day: &str) -> TimetableRecord {
        TimetableRecord {
            class_id: "C1".into(),
            school_id: "S1".into(),
            day: day.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_all_days() {
        let store = MemoryStore::default();
        let records = vec![record("Monday"), record("Tuesday")];

        let report = save_records(&store, &records).await;

        assert!(report.is_complete());
        assert_eq!(report.saved_days().collect::<Vec<_>>(), ["Monday", "Tuesday"]);
        assert_eq!(store.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_stops_at_first_failure() {
        let store = MemoryStore {
            fail_day: Some("Tuesday".into()),
            ..Default::default()
        };
        let records = vec![record("Monday"), record("Tuesday"), record("Wednesday")];

        let report = save_records(&store, &records).await;

        assert!(!report.is_complete());
        assert_eq!(report.failed_day().unwrap().day, "Tuesday");
        assert_eq!(report.outcomes[0].status, SaveStatus::Saved);
        assert_eq!(report.outcomes[2].status, SaveStatus::Skipped);

        // Monday stays written
        let stored = store.records.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].day, "Monday");
    }

    #[tokio::test]
    async fn test_load_failure_degrades_to_empty() {
        let store = MemoryStore {
            fail_reads: true,
            ..Default::default()
        };
        store.records.lock().unwrap().push(record("Monday"));

        assert!(load_records(&store, "C1", "S1").await.is_empty());
    }

    #[test]
    fn test_report_json_shape() {
        let report = SaveReport {
            outcomes: vec![
                DayOutcome {
                    day: "Monday".into(),
                    status: SaveStatus::Failed {
                        reason: "boom".into(),
                    },
                },
                DayOutcome {
                    day: "Tuesday".into(),
                    status: SaveStatus::Skipped,
                },
            ],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][0]["reason"], "boom");
        assert_eq!(json["outcomes"][1]["status"], "skipped");
    }
}

//! Grid → per-day persistence records.

use super::grid::TimetableGrid;
use super::types::{PeriodEntry, PeriodMeta, TimetableRecord};

impl TimetableGrid {
    /// Flattens the grid into one record per day, in the grid's day order.
    ///
    /// Each record lists one period per entry of `periods`; times come from
    /// `periods`, subject and teacher from the grid. Unassigned teachers are
    /// left out of the record rather than sent as empty strings.
    pub fn to_records(
        &self,
        class_id: &str,
        school_id: &str,
        periods: &[PeriodMeta],
    ) -> Vec<TimetableRecord> {
        self.rows()
            .map(|(day, slots)| TimetableRecord {
                id: None,
                class_id: class_id.to_string(),
                day: day.to_string(),
                school_id: school_id.to_string(),
                periods: periods
                    .iter()
                    .enumerate()
                    .map(|(index, meta)| {
                        let slot = slots.get(index).cloned().unwrap_or_default();
                        PeriodEntry {
                            start_time: meta.start_label(),
                            end_time: meta.end_label(),
                            subject: slot.subject,
                            teacher_id: slot.teacher_id.filter(|id| !id.is_empty()),
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}

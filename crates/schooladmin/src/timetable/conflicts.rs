//! Teacher double-booking detection.

use super::grid::TimetableGrid;
use super::types::{Day, PeriodMeta, TeacherDirectory};
use serde::Serialize;

/// Conflict messages accumulated while a grid is being edited.
///
/// Keeps first-seen order and never holds the same message twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConflictLog {
    messages: Vec<String>,
}

impl ConflictLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` unless it is already present. Returns true if appended.
    pub fn push(&mut self, message: String) -> bool {
        if self.messages.contains(&message) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Removes the `count` oldest messages, keeping the rest in order.
    pub fn clear_first(&mut self, count: usize) {
        let count = count.min(self.messages.len());
        self.messages.drain(..count);
    }
}

/// Scans `day` for slots at `period` already held by `teacher_id` and records
/// one message per collision in `log`.
///
/// Only the given day is examined. Teachers missing from `directory` produce no
/// message. Returns how many new messages were appended.
pub fn check_conflicts(
    grid: &TimetableGrid,
    day: Day,
    period: usize,
    teacher_id: &str,
    periods: &[PeriodMeta],
    directory: &TeacherDirectory,
    log: &mut ConflictLog,
) -> usize {
    let Some(slots) = grid.day_slots(day) else {
        return 0;
    };

    let start = periods
        .get(period)
        .map(PeriodMeta::start_label)
        .unwrap_or_else(|| format!("period {}", period + 1));

    let mut added = 0;
    for (index, slot) in slots.iter().enumerate() {
        if index != period || slot.teacher_id.as_deref() != Some(teacher_id) {
            continue;
        }
        let Some(name) = directory.resolve(teacher_id) else {
            continue;
        };
        if log.push(format!("{name} is already assigned at {start} on {day}")) {
            added += 1;
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::types::{SlotField, Teacher, TimetableLayout};

    fn directory() -> TeacherDirectory {
        TeacherDirectory::new(vec![Teacher {
            id: "T1".into(),
            name: "Ada Lovelace".into(),
        }])
    }

    fn grid_with(day: Day, period: usize, teacher_id: &str) -> TimetableGrid {
        let layout = TimetableLayout::reference();
        let mut grid = TimetableGrid::empty(&layout.days, layout.period_count());
        grid.set_slot_field(day, period, SlotField::TeacherId, teacher_id)
            .unwrap();
        grid
    }

    fn check(
        grid: &TimetableGrid,
        day: Day,
        period: usize,
        teacher_id: &str,
        log: &mut ConflictLog,
    ) -> usize {
        let layout = TimetableLayout::reference();
        check_conflicts(grid, day, period, teacher_id, &layout.periods, &directory(), log)
    }

    #[test]
    fn test_log_dedups_and_keeps_order() {
        let mut log = ConflictLog::new();
        assert!(log.push("b".into()));
        assert!(log.push("a".into()));
        assert!(!log.push("b".into()));
        assert_eq!(log.messages(), &["b".to_string(), "a".to_string()]);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_clear_first_keeps_newer_messages() {
        let mut log = ConflictLog::new();
        log.push("a".into());
        log.push("b".into());
        log.push("c".into());

        log.clear_first(2);
        assert_eq!(log.messages(), &["c".to_string()]);

        log.clear_first(5);
        assert!(log.is_empty());
    }

    #[test]
    fn test_check_reports_held_slot() {
        let grid = grid_with(Day::Monday, 0, "T1");

        let mut log = ConflictLog::new();
        let added = check(&grid, Day::Monday, 0, "T1", &mut log);

        assert_eq!(added, 1);
        assert_eq!(
            log.messages()[0],
            "Ada Lovelace is already assigned at 08:00 on Monday"
        );

        let again = check(&grid, Day::Monday, 0, "T1", &mut log);
        assert_eq!(again, 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_check_is_day_scoped() {
        let grid = grid_with(Day::Monday, 0, "T1");

        let mut log = ConflictLog::new();
        check(&grid, Day::Tuesday, 0, "T1", &mut log);
        check(&grid, Day::Monday, 1, "T1", &mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn test_unknown_teacher_is_skipped() {
        let grid = grid_with(Day::Monday, 0, "T9");

        let mut log = ConflictLog::new();
        let added = check(&grid, Day::Monday, 0, "T9", &mut log);
        assert_eq!(added, 0);
        assert!(log.is_empty());
    }
}

//! Dense day × period grid for one class.

use super::error::SlotError;
use super::types::{Day, Slot, SlotField, TimetableRecord};
use tracing::debug;

/// Slot assignments of one class for a whole week.
///
/// The grid is dense: every configured day has exactly `period_count` slots from
/// the moment it is constructed, and no operation adds or removes cells. Slots
/// nobody assigned hold [`Slot::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableGrid {
    days: Vec<Day>,
    period_count: usize,
    cells: Vec<Vec<Slot>>,
}

impl TimetableGrid {
    /// Creates an all-default grid. Repeated days are kept once, first position wins.
    pub fn empty(days: &[Day], period_count: usize) -> Self {
        let mut unique = Vec::with_capacity(days.len());
        for day in days {
            if !unique.contains(day) {
                unique.push(*day);
            }
        }

        let cells = vec![vec![Slot::default(); period_count]; unique.len()];
        Self {
            days: unique,
            period_count,
            cells,
        }
    }

    /// Builds a grid from persisted per-day records.
    ///
    /// Each record's periods are laid over its day by position. Records for days
    /// that do not parse or are not in `days`, and periods past `period_count`,
    /// are skipped without error so that older or newer record shapes still load.
    /// When a day appears in several records, later records win position by position.
    pub fn hydrate(records: &[TimetableRecord], days: &[Day], period_count: usize) -> Self {
        let mut grid = Self::empty(days, period_count);

        for record in records {
            let Some(row) = record
                .day
                .parse::<Day>()
                .ok()
                .and_then(|day| grid.day_index(day))
            else {
                debug!(
                    day = %record.day,
                    class_id = %record.class_id,
                    "Skipping record for unknown day"
                );
                continue;
            };

            if record.periods.len() > period_count {
                debug!(
                    day = %record.day,
                    stored = record.periods.len(),
                    period_count,
                    "Ignoring periods beyond the configured count"
                );
            }

            for (slot, entry) in grid.cells[row].iter_mut().zip(&record.periods) {
                slot.subject = entry.subject.clone();
                slot.teacher_id = entry.teacher_id.clone().filter(|id| !id.is_empty());
            }
        }

        grid
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    /// Number of addressable slots (`days × periods`).
    pub fn slot_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    fn day_index(&self, day: Day) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    /// Verifies that `(day, period)` addresses a slot of this grid.
    pub fn check_bounds(&self, day: Day, period: usize) -> Result<(), SlotError> {
        if self.day_index(day).is_none() {
            return Err(SlotError::DayNotInGrid(day));
        }
        if period >= self.period_count {
            return Err(SlotError::PeriodOutOfRange {
                index: period,
                count: self.period_count,
            });
        }
        Ok(())
    }

    pub fn slot(&self, day: Day, period: usize) -> Option<&Slot> {
        self.day_slots(day)?.get(period)
    }

    /// All slots of one day, in period order.
    pub fn day_slots(&self, day: Day) -> Option<&[Slot]> {
        self.day_index(day).map(|row| self.cells[row].as_slice())
    }

    /// Iterates `(day, slots)` in day order.
    pub fn rows(&self) -> impl Iterator<Item = (Day, &[Slot])> + '_ {
        self.days
            .iter()
            .copied()
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Replaces one field of one slot; the other field is left as it was.
    ///
    /// An empty `value` clears the field. Out-of-range coordinates return an
    /// error and leave the grid untouched.
    pub fn set_slot_field(
        &mut self,
        day: Day,
        period: usize,
        field: SlotField,
        value: &str,
    ) -> Result<(), SlotError> {
        self.check_bounds(day, period)?;
        let row = self
            .day_index(day)
            .ok_or(SlotError::DayNotInGrid(day))?;
        let slot = &mut self.cells[row][period];

        match field {
            SlotField::Subject => slot.subject = value.to_string(),
            SlotField::TeacherId => {
                slot.teacher_id = Some(value.to_string()).filter(|id| !id.is_empty())
            }
        }

        Ok(())
    }
}

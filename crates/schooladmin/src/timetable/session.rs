//! The editing session behind the timetable screen.

use super::conflicts::{check_conflicts, ConflictLog};
use super::error::SlotError;
use super::grid::TimetableGrid;
use super::persist::SaveReport;
use super::types::{
    Day, PeriodMeta, Slot, SlotField, Teacher, TeacherDirectory, TimetableLayout, TimetableRecord,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Data fetched for a newly selected class.
#[derive(Debug, Clone, Default)]
pub struct LoadedTimetable {
    pub records: Vec<TimetableRecord>,
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<String>,
}

/// Issued when a class is selected; carries the epoch the load belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub epoch: u64,
    pub class_id: String,
    pub school_id: String,
}

/// Snapshot of a grid on its way to the store.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub epoch: u64,
    pub class_id: String,
    pub records: Vec<TimetableRecord>,
    /// Conflicts already logged when the snapshot was taken
    pub conflict_count: usize,
}

/// One row of [`GridView`].
#[derive(Debug, Clone, Serialize)]
pub struct GridRow {
    pub day: Day,
    pub slots: Vec<Slot>,
}

/// Serializable snapshot of a session for the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub class_id: Option<String>,
    pub school_id: Option<String>,
    pub periods: Vec<PeriodMeta>,
    pub rows: Vec<GridRow>,
    pub subjects: Vec<String>,
    pub teachers: Vec<Teacher>,
    pub conflicts: ConflictLog,
}

#[derive(Debug, Clone)]
struct Selection {
    class_id: String,
    school_id: String,
}

/// Grid, teacher directory and conflict log of the class being edited.
///
/// Selecting another class throws all of it away. Async work started for a
/// selection is tagged with the session epoch; results arriving after the
/// selection changed are dropped. Until the stored timetable of the selected
/// class has been applied, the grid is a placeholder that can be neither
/// edited nor saved.
#[derive(Debug)]
pub struct EditSession {
    layout: TimetableLayout,
    selection: Option<Selection>,
    loaded: bool,
    grid: TimetableGrid,
    teachers: TeacherDirectory,
    subjects: Vec<String>,
    conflicts: ConflictLog,
    epoch: u64,
}

impl EditSession {
    pub fn new(layout: TimetableLayout) -> Self {
        let grid = TimetableGrid::empty(&layout.days, layout.period_count());
        Self {
            layout,
            selection: None,
            loaded: false,
            grid,
            teachers: TeacherDirectory::default(),
            subjects: Vec::new(),
            conflicts: ConflictLog::new(),
            epoch: 0,
        }
    }

    /// Switches to another class and resets grid and conflicts.
    ///
    /// The returned ticket must be handed back to [`apply_selection`](Self::apply_selection)
    /// together with the fetched data.
    pub fn begin_selection(&mut self, class_id: &str, school_id: &str) -> SelectionTicket {
        self.epoch += 1;
        self.selection = Some(Selection {
            class_id: class_id.to_string(),
            school_id: school_id.to_string(),
        });
        self.loaded = false;
        self.grid = TimetableGrid::empty(&self.layout.days, self.layout.period_count());
        self.teachers = TeacherDirectory::default();
        self.subjects.clear();
        self.conflicts.clear();

        debug!(class_id, school_id, epoch = self.epoch, "Class selected");

        SelectionTicket {
            epoch: self.epoch,
            class_id: class_id.to_string(),
            school_id: school_id.to_string(),
        }
    }

    /// Hydrates the grid from `loaded`. Returns false and changes nothing when
    /// another class was selected after `ticket` was issued.
    pub fn apply_selection(&mut self, ticket: &SelectionTicket, loaded: LoadedTimetable) -> bool {
        if ticket.epoch != self.epoch {
            warn!(
                class_id = %ticket.class_id,
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "Dropping timetable load for a class that is no longer selected"
            );
            return false;
        }

        self.grid = TimetableGrid::hydrate(
            &loaded.records,
            &self.layout.days,
            self.layout.period_count(),
        );
        self.teachers = TeacherDirectory::new(loaded.teachers);
        self.subjects = loaded.subjects;
        self.loaded = true;
        true
    }

    /// Edits one slot field.
    ///
    /// Assigning a teacher first checks whether that teacher already holds the
    /// same period on the same day and records a conflict message if so. The
    /// edit is applied either way. Rejected with [`SlotError::NotLoaded`] while
    /// the selected class is still loading.
    pub fn set_slot_field(
        &mut self,
        day: Day,
        period: usize,
        field: SlotField,
        value: &str,
    ) -> Result<&Slot, SlotError> {
        if !self.loaded {
            return Err(SlotError::NotLoaded);
        }
        self.grid.check_bounds(day, period)?;

        if field == SlotField::TeacherId && !value.is_empty() {
            check_conflicts(
                &self.grid,
                day,
                period,
                value,
                &self.layout.periods,
                &self.teachers,
                &mut self.conflicts,
            );
        }

        self.grid.set_slot_field(day, period, field, value)?;
        self.grid
            .slot(day, period)
            .ok_or(SlotError::PeriodOutOfRange {
                index: period,
                count: self.grid.period_count(),
            })
    }

    /// Serializes the grid for saving. `None` until a class is selected and
    /// its timetable loaded.
    pub fn prepare_save(&self) -> Option<SaveTicket> {
        let selection = self.selection.as_ref().filter(|_| self.loaded)?;
        Some(SaveTicket {
            epoch: self.epoch,
            class_id: selection.class_id.clone(),
            records: self.grid.to_records(
                &selection.class_id,
                &selection.school_id,
                &self.layout.periods,
            ),
            conflict_count: self.conflicts.len(),
        })
    }

    /// Records the result of a save. Once every day is written, the conflicts
    /// logged before the snapshot are cleared; later ones belong to unsaved
    /// edits and stay. Returns false when the class changed while saving.
    pub fn finish_save(&mut self, ticket: &SaveTicket, report: &SaveReport) -> bool {
        if ticket.epoch != self.epoch {
            warn!(
                class_id = %ticket.class_id,
                "Save finished after the class selection changed, ignoring result"
            );
            return false;
        }

        if report.is_complete() {
            info!(class_id = %ticket.class_id, "Timetable saved");
            self.conflicts.clear_first(ticket.conflict_count);
        }
        true
    }

    pub fn class_id(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.class_id.as_str())
    }

    pub fn school_id(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.school_id.as_str())
    }

    /// True once the stored timetable of the selected class has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn grid(&self) -> &TimetableGrid {
        &self.grid
    }

    pub fn conflicts(&self) -> &ConflictLog {
        &self.conflicts
    }

    pub fn view(&self) -> GridView {
        GridView {
            class_id: self.class_id().map(str::to_string),
            school_id: self.school_id().map(str::to_string),
            periods: self.layout.periods.clone(),
            rows: self
                .grid
                .rows()
                .map(|(day, slots)| GridRow {
                    day,
                    slots: slots.to_vec(),
                })
                .collect(),
            subjects: self.subjects.clone(),
            teachers: self.teachers.teachers().to_vec(),
            conflicts: self.conflicts.clone(),
        }
    }
}

//! Timetable grid engine.
//!
//! Converts the per-day period lists stored by the remote API into a dense
//! day × period grid, applies single-slot edits, flags teachers booked twice in
//! the same period, and turns the grid back into per-day records for saving.
//! Everything here except [`persist`] is synchronous and free of I/O.

mod conflicts;
mod error;
mod grid;
pub mod persist;
mod records;
mod session;
mod types;

pub use conflicts::{check_conflicts, ConflictLog};
pub use error::SlotError;
pub use grid::TimetableGrid;
pub use persist::{load_records, save_records, DayOutcome, SaveReport, SaveStatus, TimetableStore};
pub use session::{EditSession, GridRow, GridView, LoadedTimetable, SaveTicket, SelectionTicket};
pub use types::*;

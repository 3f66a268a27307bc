//! Error types for grid edits.

use super::types::Day;
use thiserror::Error;

/// Why a slot edit was rejected. A rejected edit leaves the grid unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The day name is not a teaching day
    #[error("Unknown day: {0}")]
    UnknownDay(String),

    /// The day exists but this grid was not built with it
    #[error("{0} is not part of this timetable")]
    DayNotInGrid(Day),

    /// Period index beyond the configured period count
    #[error("Period {index} out of range (timetable has {count} periods)")]
    PeriodOutOfRange { index: usize, count: usize },

    /// Field name other than subject/teacherId
    #[error("Unknown slot field: {0}")]
    UnknownField(String),

    /// No timetable has been loaded into the session yet
    #[error("Timetable is still loading")]
    NotLoaded,
}

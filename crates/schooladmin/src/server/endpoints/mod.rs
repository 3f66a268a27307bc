pub mod directory;
pub mod status;
pub mod timetable;

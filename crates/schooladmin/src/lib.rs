//! Timetable editing service for a multi-school administration dashboard.
//!
//! The [`timetable`] module holds the grid engine; [`api`] talks to the
//! remote REST backend and [`server`] exposes the editor over HTTP.

pub mod api;
pub mod config;
pub mod server;
pub mod timetable;
pub mod types;

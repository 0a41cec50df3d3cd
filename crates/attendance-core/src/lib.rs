//! Core attendance model and aggregation.
//!
//! Normalises raw attendance records, classifies punch-in times and rolls a
//! month of records up into per-day entries and [`models::MonthlyStats`].
//! Everything here is synchronous and side-effect free apart from the
//! settings persistence in [`settings`].

pub mod aggregator;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use aggregator::{build_month_attendance, compute_monthly_stats, MonthAttendance};
pub use error::{AttendanceError, Result};

//! Data layer for the attendance reports.
//!
//! Discovers and loads attendance exports from disk, splits them by
//! employee and turns aggregator output into month reports and team
//! summaries.

pub mod reader;
pub mod report;

pub use attendance_core as core;

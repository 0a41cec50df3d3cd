//! Per-employee month reports and the team roll-up.
//!
//! Thin layer over [`attendance_core::aggregator`]: it decides which records
//! belong to whom and bundles the aggregator output with display strings
//! for the presentation layer.

use std::collections::BTreeMap;

use attendance_core::aggregator::{build_month_attendance, compute_monthly_stats, CalendarDay};
use attendance_core::formatting::{format_day_label, format_hours, format_punch};
use attendance_core::models::{AttendanceRecord, AttendanceStatus, MonthlyStats, PunctualityPolicy};
use attendance_core::time_utils::YearMonth;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Display label for records that carry no employee id.
pub const UNASSIGNED: &str = "unassigned";

/// The id to show for `employee_id`, [`UNASSIGNED`] when there is none.
pub fn employee_label(employee_id: Option<&str>) -> &str {
    employee_id.unwrap_or(UNASSIGNED)
}

// ── CalendarRow ───────────────────────────────────────────────────────────────

/// One display-ready calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarRow {
    pub date: NaiveDate,
    /// e.g. `"Mon 04 Mar"`.
    pub label: String,
    pub status: AttendanceStatus,
    pub punch_in: String,
    pub punch_out: String,
    /// Worked time as `H:MM`.
    pub hours: String,
    pub recorded: bool,
}

impl CalendarRow {
    fn from_day(day: &CalendarDay, use_12h: bool) -> Self {
        let attendance = &day.attendance;
        Self {
            date: day.date,
            label: format_day_label(day.date),
            status: attendance.status.clone(),
            punch_in: format_punch(attendance.punch_in.as_ref(), use_12h),
            punch_out: format_punch(attendance.punch_out.as_ref(), use_12h),
            hours: format_hours(attendance.total_hours),
            recorded: day.recorded,
        }
    }
}

// ── MonthReport ───────────────────────────────────────────────────────────────

/// Everything the calendar view shows for one employee and month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    /// `None` for records without an employee id.
    pub employee_id: Option<String>,
    pub month: YearMonth,
    pub days: Vec<CalendarRow>,
    pub stats: MonthlyStats,
    /// Percentage with one decimal.
    pub attendance_rate: f64,
    /// Mean hours per present day, as `H:MM`.
    pub average_hours: String,
}

impl MonthReport {
    /// Build the report from one employee's records (any date range).
    pub fn build(
        employee_id: Option<&str>,
        records: &[AttendanceRecord],
        month: YearMonth,
        policy: &PunctualityPolicy,
        use_12h: bool,
    ) -> Self {
        let attendance = build_month_attendance(records, month);
        let stats = compute_monthly_stats(&attendance, policy);
        let days = attendance
            .calendar()
            .iter()
            .map(|day| CalendarRow::from_day(day, use_12h))
            .collect();

        Self {
            employee_id: employee_id.map(str::to_string),
            month,
            days,
            attendance_rate: stats.attendance_rate(),
            average_hours: format_hours(stats.average_hours()),
            stats,
        }
    }
}

// ── TeamSummary ───────────────────────────────────────────────────────────────

/// One employee's line in the team summary.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: Option<String>,
    pub stats: MonthlyStats,
    pub attendance_rate: f64,
}

/// Month statistics for every employee in an export.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub month: YearMonth,
    /// Sorted by employee id, records without one first.
    pub employees: Vec<EmployeeSummary>,
    /// Sum of every employee's counters.
    pub totals: MonthlyStats,
    pub attendance_rate: f64,
}

impl TeamSummary {
    pub fn build(records: &[AttendanceRecord], month: YearMonth, policy: &PunctualityPolicy) -> Self {
        let mut totals = MonthlyStats::default();
        let employees: Vec<EmployeeSummary> = group_by_employee(records)
            .into_iter()
            .map(|(employee_id, records)| {
                let attendance = build_month_attendance(&records, month);
                let stats = compute_monthly_stats(&attendance, policy);
                totals.merge(&stats);
                EmployeeSummary {
                    employee_id,
                    attendance_rate: stats.attendance_rate(),
                    stats,
                }
            })
            .collect();

        info!("Summarised {} employee(s) for {}", employees.len(), month);

        Self {
            month,
            employees,
            attendance_rate: totals.attendance_rate(),
            totals,
        }
    }
}

// ── Grouping ──────────────────────────────────────────────────────────────────

/// Split a mixed export by employee id; records without one share the
/// `None` group. Input order is preserved within each group.
pub fn group_by_employee(
    records: &[AttendanceRecord],
) -> BTreeMap<Option<String>, Vec<AttendanceRecord>> {
    let mut groups: BTreeMap<Option<String>, Vec<AttendanceRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.employee_id.clone())
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Records belonging to `employee_id` (`None` selects records without one).
pub fn records_for_employee(
    records: &[AttendanceRecord],
    employee_id: Option<&str>,
) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|r| r.employee_id.as_deref() == employee_id)
        .cloned()
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

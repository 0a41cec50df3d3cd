//! Plain-text and JSON renderers for the report views.

use std::fmt::Write as _;

use attendance_core::formatting::format_hours;
use attendance_core::models::MonthlyStats;
use attendance_data::report::{employee_label, MonthReport, TeamSummary};
use serde::Serialize;

/// Pretty-printed JSON for either report type.
pub fn to_json<T: Serialize>(report: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Calendar table for one employee, followed by the month statistics.
pub fn render_calendar(report: &MonthReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Attendance for {} - {}",
        employee_label(report.employee_id.as_deref()),
        report.month
    );
    let _ = writeln!(
        out,
        "{:<12} {:<10} {:>9} {:>9} {:>7}",
        "Day", "Status", "In", "Out", "Hours"
    );
    for row in &report.days {
        let marker = if row.recorded { "" } else { " *" };
        let _ = writeln!(
            out,
            "{:<12} {:<10} {:>9} {:>9} {:>7}{}",
            row.label,
            row.status.to_string(),
            row.punch_in,
            row.punch_out,
            row.hours,
            marker
        );
    }
    let _ = writeln!(out, "(* no record for this day)");
    out.push('\n');
    out.push_str(&render_stats(&report.stats, report.attendance_rate));
    let _ = writeln!(out, "Average per present day: {}", report.average_hours);
    out
}

/// One line per employee plus a totals line.
pub fn render_team(summary: &TeamSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Team attendance - {}", summary.month);
    let _ = writeln!(
        out,
        "{:<14} {:>7} {:>6} {:>7} {:>5} {:>8} {:>8} {:>7}",
        "Employee", "Present", "Absent", "OnTime", "Late", "TooLate", "Hours", "Rate"
    );
    for e in &summary.employees {
        let label = employee_label(e.employee_id.as_deref());
        out.push_str(&team_line(label, &e.stats, e.attendance_rate));
    }
    out.push_str(&team_line("TOTAL", &summary.totals, summary.attendance_rate));
    out
}

fn team_line(label: &str, stats: &MonthlyStats, rate: f64) -> String {
    format!(
        "{:<14} {:>7} {:>6} {:>7} {:>5} {:>8} {:>8} {:>6.1}%\n",
        label,
        stats.present,
        stats.absent,
        stats.on_time,
        stats.late,
        stats.too_late,
        format_hours(stats.total_hours),
        rate
    )
}

fn render_stats(stats: &MonthlyStats, rate: f64) -> String {
    format!(
        "Present: {}  Absent: {}  Rate: {:.1}%\n\
         On time: {}  Late: {}  Too late: {}\n\
         Total hours: {}\n",
        stats.present,
        stats.absent,
        rate,
        stats.on_time,
        stats.late,
        stats.too_late,
        format_hours(stats.total_hours)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::models::{AttendanceRecord, AttendanceStatus, PunctualityPolicy};
    use attendance_core::time_utils::YearMonth;
    use chrono::NaiveDate;

    fn records() -> Vec<AttendanceRecord> {
        vec![
            AttendanceRecord {
                employee_id: Some("E1".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 3, 4),
                status: AttendanceStatus::Present,
                punch_in: None,
                punch_out: None,
                total_hours: 8.5,
            },
            AttendanceRecord {
                employee_id: Some("E2".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 3, 4),
                status: AttendanceStatus::Absent,
                punch_in: None,
                punch_out: None,
                total_hours: 0.0,
            },
        ]
    }

    #[test]
    fn test_render_calendar_lists_every_day() {
        let month = YearMonth::new(2024, 3).unwrap();
        let report = MonthReport::build(
            Some("E1"),
            &records()[..1],
            month,
            &PunctualityPolicy::default(),
            true,
        );
        let text = render_calendar(&report);

        assert!(text.starts_with("Attendance for E1 - 2024-03"));
        assert!(text.contains("Mon 04 Mar"));
        assert!(text.contains("Sun 31 Mar"));
        assert!(text.contains("Present: 1  Absent: 0  Rate: 100.0%"));
        assert!(text.contains("Total hours: 8:30"));
    }

    #[test]
    fn test_render_team_has_totals_line() {
        let month = YearMonth::new(2024, 3).unwrap();
        let summary = TeamSummary::build(&records(), month, &PunctualityPolicy::default());
        let text = render_team(&summary);

        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().any(|l| l.starts_with("E1")));
        assert!(text.lines().any(|l| l.starts_with("E2")));
        let total = text.lines().last().unwrap();
        assert!(total.starts_with("TOTAL"));
        assert!(total.ends_with("50.0%"));
    }

    #[test]
    fn test_to_json() {
        let month = YearMonth::new(2024, 3).unwrap();
        let summary = TeamSummary::build(&records(), month, &PunctualityPolicy::default());
        let json = to_json(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["present"], 1);
        assert_eq!(value["employees"].as_array().unwrap().len(), 2);
    }
}

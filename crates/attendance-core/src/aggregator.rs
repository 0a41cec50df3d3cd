//! Monthly attendance aggregation.
//!
//! [`build_month_attendance`] narrows an employee's records to one month and
//! keys them by day. [`compute_monthly_stats`] rolls that mapping up into
//! present/absent counts, punctuality buckets and worked hours. Both are
//! pure: malformed input degrades to fallback values instead of errors.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::models::{
    AttendanceRecord, AttendanceStatus, DayAttendance, MonthlyStats, Punch, Punctuality,
    PunctualityPolicy,
};
use crate::time_utils::YearMonth;

// ── MonthAttendance ───────────────────────────────────────────────────────────

/// Recorded days of one month, keyed by 1-based day of month.
///
/// Only days that had a record are stored. [`MonthAttendance::day`] supplies
/// the absent default for the rest and applies the Sunday override.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAttendance {
    pub month: YearMonth,
    pub days: BTreeMap<u32, DayAttendance>,
}

/// One resolved calendar cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Whether the source data had a record for this day.
    pub recorded: bool,
    pub attendance: DayAttendance,
}

impl MonthAttendance {
    /// Resolved attendance for `day`: the stored entry or the absent default,
    /// with the status forced to `Sunday` on Sundays.
    ///
    /// Days outside the month resolve to the plain default.
    pub fn day(&self, day: u32) -> DayAttendance {
        let mut resolved = self.days.get(&day).cloned().unwrap_or_default();
        if let Some(date) = self.month.date(day) {
            apply_sunday_override(date, &mut resolved);
        }
        resolved
    }

    /// Every day of the month, resolved through [`MonthAttendance::day`].
    pub fn calendar(&self) -> Vec<CalendarDay> {
        self.month
            .dates()
            .map(|date| CalendarDay {
                date,
                recorded: self.days.contains_key(&date.day()),
                attendance: self.day(date.day()),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn apply_sunday_override(date: NaiveDate, day: &mut DayAttendance) {
    if date.weekday() == Weekday::Sun {
        day.status = AttendanceStatus::Sunday;
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Collect the records that fall inside `month`, keyed by day of month.
///
/// Records without a parseable date never match. If two records share a
/// day, the later one in `records` wins.
pub fn build_month_attendance(records: &[AttendanceRecord], month: YearMonth) -> MonthAttendance {
    let mut days = BTreeMap::new();
    let mut undated = 0usize;

    for record in records {
        let Some(date) = record.date else {
            undated += 1;
            continue;
        };
        if month.contains(date) {
            days.insert(date.day(), DayAttendance::from(record));
        }
    }

    if undated > 0 {
        debug!("{} record(s) without a usable date excluded from {}", undated, month);
    }

    MonthAttendance { month, days }
}

/// Roll the recorded days of a month up into [`MonthlyStats`].
///
/// The Sunday override is applied before classification, so a Sunday with a
/// "present" record counts toward nothing.
pub fn compute_monthly_stats(
    attendance: &MonthAttendance,
    policy: &PunctualityPolicy,
) -> MonthlyStats {
    let mut stats = MonthlyStats::default();

    for &day in attendance.days.keys() {
        let resolved = attendance.day(day);
        match resolved.status {
            AttendanceStatus::Present => {
                stats.present += 1;
                if let Some(punch) = &resolved.punch_in {
                    match classify_punch(punch, policy) {
                        Punctuality::OnTime => stats.on_time += 1,
                        Punctuality::Late => stats.late += 1,
                        Punctuality::TooLate => stats.too_late += 1,
                    }
                }
                stats.total_hours += resolved.total_hours;
            }
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::Sunday | AttendanceStatus::Unknown(_) => {}
        }
    }

    stats
}

/// Minutes between the shift start and `time`; negative when early.
pub fn minutes_late(time: NaiveTime, policy: &PunctualityPolicy) -> i64 {
    let minute_of_day = |t: NaiveTime| i64::from(t.hour()) * 60 + i64::from(t.minute());
    minute_of_day(time) - minute_of_day(policy.shift_start)
}

/// Bucket a punch-in. An unparseable punch counts as late.
pub fn classify_punch(punch: &Punch, policy: &PunctualityPolicy) -> Punctuality {
    let Some(time) = punch.time() else {
        return Punctuality::Late;
    };
    let late_by = minutes_late(time, policy);
    if late_by <= 0 {
        Punctuality::OnTime
    } else if late_by <= policy.grace_minutes {
        Punctuality::Late
    } else {
        Punctuality::TooLate
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> YearMonth {
        YearMonth::new(2024, 3).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> Punch {
        Punch::At(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn record(
        day: Option<NaiveDate>,
        status: &str,
        punch_in: Option<Punch>,
        total_hours: f64,
    ) -> AttendanceRecord {
        AttendanceRecord {
            employee_id: Some("E-7".to_string()),
            date: day,
            status: AttendanceStatus::normalize(Some(status)),
            punch_in,
            punch_out: None,
            total_hours,
        }
    }

    fn stats_for(records: &[AttendanceRecord]) -> MonthlyStats {
        let attendance = build_month_attendance(records, march());
        compute_monthly_stats(&attendance, &PunctualityPolicy::default())
    }

    // ── build_month_attendance ───────────────────────────────────────────────

    #[test]
    fn test_build_keys_by_day_and_filters_month() {
        let records = vec![
            record(Some(date(2024, 2, 29)), "present", None, 8.0),
            record(Some(date(2024, 3, 4)), "present", None, 8.0),
            record(Some(date(2024, 3, 5)), "absent", None, 0.0),
            record(Some(date(2024, 4, 1)), "present", None, 8.0),
            record(Some(date(2023, 3, 4)), "present", None, 8.0),
        ];
        let attendance = build_month_attendance(&records, march());

        let keys: Vec<u32> = attendance.days.keys().copied().collect();
        assert_eq!(keys, vec![4, 5]);
    }

    #[test]
    fn test_build_excludes_undated_records() {
        let records = vec![
            record(None, "present", Some(at(9, 0)), 8.0),
            record(Some(date(2024, 3, 4)), "present", None, 8.0),
        ];
        let attendance = build_month_attendance(&records, march());
        assert_eq!(attendance.len(), 1);
    }

    #[test]
    fn test_build_duplicate_day_last_wins() {
        let records = vec![
            record(Some(date(2024, 3, 4)), "absent", None, 0.0),
            record(Some(date(2024, 3, 4)), "present", None, 6.0),
        ];
        let attendance = build_month_attendance(&records, march());
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance.days[&4].status, AttendanceStatus::Present);
        assert_eq!(attendance.days[&4].total_hours, 6.0);
    }

    #[test]
    fn test_build_does_not_override_stored_entry() {
        let records = vec![record(Some(date(2024, 3, 10)), "present", None, 4.0)];
        let attendance = build_month_attendance(&records, march());
        assert_eq!(attendance.days[&10].status, AttendanceStatus::Present);
        assert_eq!(attendance.day(10).status, AttendanceStatus::Sunday);
    }

    // ── MonthAttendance::day / calendar ──────────────────────────────────────

    #[test]
    fn test_missing_day_defaults_to_absent() {
        let attendance = build_month_attendance(&[], march());
        let day = attendance.day(4);
        assert_eq!(day.status, AttendanceStatus::Absent);
        assert_eq!(day.total_hours, 0.0);
    }

    #[test]
    fn test_missing_sunday_resolves_to_sunday() {
        let attendance = build_month_attendance(&[], march());
        // 2024-03-03 is a Sunday.
        assert_eq!(attendance.day(3).status, AttendanceStatus::Sunday);
    }

    #[test]
    fn test_calendar_covers_every_day() {
        let records = vec![record(Some(date(2024, 3, 4)), "p", Some(at(9, 0)), 8.0)];
        let calendar = build_month_attendance(&records, march()).calendar();

        assert_eq!(calendar.len(), 31);
        assert_eq!(calendar[0].date, date(2024, 3, 1));
        assert!(calendar[3].recorded);
        assert_eq!(calendar[3].attendance.status, AttendanceStatus::Present);
        assert!(!calendar[4].recorded);
        assert_eq!(calendar[4].attendance.status, AttendanceStatus::Absent);

        let sundays = calendar
            .iter()
            .filter(|c| c.attendance.status == AttendanceStatus::Sunday)
            .count();
        assert_eq!(sundays, 5);
    }

    // ── compute_monthly_stats: worked examples ───────────────────────────────

    #[test]
    fn test_present_on_time_with_clock_hours() {
        let stats = stats_for(&[record(
            Some(date(2024, 3, 4)),
            "P",
            Some(at(9, 25)),
            crate::models::WorkedHours::from_text("8:15").as_decimal(),
        )]);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.on_time, 1);
        assert_eq!(stats.late + stats.too_late, 0);
        assert!((stats.total_hours - 8.25).abs() < 1e-9);
    }

    #[test]
    fn test_fifteen_minutes_late_is_too_late() {
        let stats = stats_for(&[record(
            Some(date(2024, 3, 5)),
            "present",
            Some(at(9, 45)),
            0.0,
        )]);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.too_late, 1);
        assert_eq!(stats.on_time + stats.late, 0);
    }

    #[test]
    fn test_sunday_record_counts_toward_nothing() {
        let stats = stats_for(&[record(
            Some(date(2024, 3, 10)),
            "present",
            Some(at(9, 0)),
            8.0,
        )]);
        assert_eq!(stats, MonthlyStats::default());
    }

    #[test]
    fn test_absent_has_no_punctuality_or_hours() {
        let stats = stats_for(&[record(Some(date(2024, 3, 6)), "absent", Some(at(11, 0)), 3.0)]);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.present, 0);
        assert_eq!(stats.on_time + stats.late + stats.too_late, 0);
        assert_eq!(stats.total_hours, 0.0);
    }

    #[test]
    fn test_numeric_hours_added_exactly() {
        let stats = stats_for(&[record(Some(date(2024, 3, 7)), "present", None, 7.5)]);
        assert_eq!(stats.total_hours, 7.5);
        assert_eq!(stats.on_time + stats.late + stats.too_late, 0);
    }

    #[test]
    fn test_zero_hours_leave_accumulator_unchanged() {
        let zero = crate::models::WorkedHours::from_text("0:00").as_decimal();
        let stats = stats_for(&[record(Some(date(2024, 3, 7)), "present", None, zero)]);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.total_hours, 0.0);
    }

    // ── compute_monthly_stats: buckets and invariants ────────────────────────

    #[test]
    fn test_punctuality_boundaries() {
        let policy = PunctualityPolicy::default();
        assert_eq!(classify_punch(&at(9, 30), &policy), Punctuality::OnTime);
        assert_eq!(classify_punch(&at(8, 5), &policy), Punctuality::OnTime);
        assert_eq!(classify_punch(&at(9, 31), &policy), Punctuality::Late);
        assert_eq!(classify_punch(&at(9, 40), &policy), Punctuality::Late);
        assert_eq!(classify_punch(&at(9, 41), &policy), Punctuality::TooLate);
    }

    #[test]
    fn test_seconds_are_ignored() {
        let policy = PunctualityPolicy::default();
        let punch = Punch::At(NaiveTime::from_hms_opt(9, 30, 59).unwrap());
        assert_eq!(classify_punch(&punch, &policy), Punctuality::OnTime);
    }

    #[test]
    fn test_unparseable_punch_counts_late() {
        let punch = Punch::Unparseable("??".to_string());
        let stats = stats_for(&[record(Some(date(2024, 3, 4)), "present", Some(punch), 0.0)]);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.late, 1);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PunctualityPolicy {
            shift_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            grace_minutes: 5,
        };
        assert_eq!(classify_punch(&at(9, 45), &policy), Punctuality::OnTime);
        assert_eq!(classify_punch(&at(10, 5), &policy), Punctuality::Late);
        assert_eq!(classify_punch(&at(10, 6), &policy), Punctuality::TooLate);
        assert_eq!(minutes_late(at(9, 45).time().unwrap(), &policy), -15);
    }

    #[test]
    fn test_unknown_status_not_counted() {
        let stats = stats_for(&[
            record(Some(date(2024, 3, 4)), "Holiday", None, 8.0),
            record(Some(date(2024, 3, 5)), "", None, 8.0),
        ]);
        assert_eq!(stats, MonthlyStats::default());
    }

    #[test]
    fn test_counts_bounded_by_recorded_days() {
        let records = vec![
            record(Some(date(2024, 3, 1)), "p", Some(at(9, 0)), 8.0),
            record(Some(date(2024, 3, 2)), "a", None, 0.0),
            record(Some(date(2024, 3, 3)), "p", Some(at(9, 0)), 8.0),
            record(Some(date(2024, 3, 4)), "leave", None, 0.0),
            record(Some(date(2024, 3, 5)), "P", Some(at(9, 35)), 7.0),
        ];
        let attendance = build_month_attendance(&records, march());
        let stats = compute_monthly_stats(&attendance, &PunctualityPolicy::default());

        assert_eq!(stats.present, 2);
        assert_eq!(stats.absent, 1);
        assert!(stats.present as usize + stats.absent as usize <= attendance.len());
        assert_eq!(stats.on_time, 1);
        assert_eq!(stats.late, 1);
        assert!((stats.total_hours - 15.0).abs() < 1e-9);
        assert!((stats.attendance_rate() - 66.7).abs() < 1e-9);
    }

    #[test]
    fn test_stats_are_idempotent() {
        let records = vec![
            record(Some(date(2024, 3, 4)), "p", Some(at(9, 50)), 8.0),
            record(Some(date(2024, 3, 5)), "a", None, 0.0),
        ];
        let attendance = build_month_attendance(&records, march());
        let policy = PunctualityPolicy::default();
        let first = compute_monthly_stats(&attendance, &policy);
        let second = compute_monthly_stats(&attendance, &policy);
        assert_eq!(first, second);
    }
}

//! Attendance data model.
//!
//! Raw export values are normalised once, at ingestion: statuses into
//! [`AttendanceStatus`], punch stamps into [`Punch`] and the several
//! worked-hours encodings into a plain `f64` via [`WorkedHours`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ── AttendanceStatus ──────────────────────────────────────────────────────────

/// Day status after normalisation of the raw status string.
///
/// Raw values are matched case-insensitively: `present`/`p`, `absent`/`a`
/// and `sunday`. Anything else (including a missing status) lands in
/// [`AttendanceStatus::Unknown`], which keeps the literal text for display
/// but is never counted as present or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Sunday,
    /// Unrecognised or missing status; holds the trimmed raw text.
    Unknown(String),
}

impl AttendanceStatus {
    /// Map a raw status string onto the closed enumeration.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unknown(String::new());
        };
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "present" | "p" => Self::Present,
            "absent" | "a" => Self::Absent,
            "sunday" => Self::Sunday,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("Present"),
            Self::Absent => f.write_str("Absent"),
            Self::Sunday => f.write_str("Sunday"),
            Self::Unknown(raw) if raw.is_empty() => f.write_str("-"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl From<AttendanceStatus> for String {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Unknown(raw) => raw,
            other => other.to_string(),
        }
    }
}

impl From<String> for AttendanceStatus {
    fn from(raw: String) -> Self {
        Self::normalize(Some(&raw))
    }
}

// ── Punch ─────────────────────────────────────────────────────────────────────

/// A punch-in or punch-out that was present in the source data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Punch {
    /// Wall-clock time of the punch, as carried by the source timestamp.
    At(NaiveTime),
    /// The value was present but did not parse as a time.
    Unparseable(String),
}

impl Punch {
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            Self::At(t) => Some(*t),
            Self::Unparseable(_) => None,
        }
    }
}

// ── WorkedHours ───────────────────────────────────────────────────────────────

/// The legacy shapes a `totalHours` value arrives in.
///
/// Parsed once at ingestion; everything downstream works with the decimal
/// hours returned by [`WorkedHours::as_decimal`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkedHours {
    /// `"H:MM"`; each part is 0 when it fails to parse.
    Clock { hours: i64, minutes: i64 },
    /// A JSON number, already in decimal hours.
    Decimal(f64),
    /// A string without a colon, parsed as a float on demand.
    Text(String),
    Missing,
}

impl WorkedHours {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Decimal),
            Value::String(s) => Self::from_text(s),
            _ => Self::Missing,
        }
    }

    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if trimmed.contains(':') {
            // Only the first two parts count; "8:15:00" is 8h15m.
            let mut parts = trimmed.split(':');
            let hours = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(0);
            let minutes = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(0);
            return Self::Clock { hours, minutes };
        }
        Self::Text(trimmed.to_string())
    }

    /// Canonical decimal hours; malformed values yield `0.0`.
    pub fn as_decimal(&self) -> f64 {
        let hours = match self {
            Self::Clock { hours, minutes } => *hours as f64 + *minutes as f64 / 60.0,
            Self::Decimal(h) => *h,
            Self::Text(s) => s.parse::<f64>().unwrap_or(0.0),
            Self::Missing => 0.0,
        };
        if hours.is_finite() {
            hours
        } else {
            0.0
        }
    }

    /// Parse a raw JSON value straight to decimal hours.
    pub fn parse(value: &Value) -> f64 {
        Self::from_value(value).as_decimal()
    }
}

// ── AttendanceRecord ──────────────────────────────────────────────────────────

/// One employee's attendance for one day, as supplied by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Owning employee, when the export carries one.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Calendar day the record describes; `None` when the raw date was unparseable.
    pub date: Option<NaiveDate>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub punch_in: Option<Punch>,
    #[serde(default)]
    pub punch_out: Option<Punch>,
    /// Worked time in decimal hours.
    #[serde(default)]
    pub total_hours: f64,
}

// ── DayAttendance ─────────────────────────────────────────────────────────────

/// Attendance for one calendar day of a displayed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAttendance {
    pub status: AttendanceStatus,
    pub total_hours: f64,
    pub punch_in: Option<Punch>,
    pub punch_out: Option<Punch>,
}

impl Default for DayAttendance {
    /// A day with no record: absent, no worked time.
    fn default() -> Self {
        Self {
            status: AttendanceStatus::Absent,
            total_hours: 0.0,
            punch_in: None,
            punch_out: None,
        }
    }
}

impl From<&AttendanceRecord> for DayAttendance {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            status: record.status.clone(),
            total_hours: record.total_hours,
            punch_in: record.punch_in.clone(),
            punch_out: record.punch_out.clone(),
        }
    }
}

// ── Punctuality ───────────────────────────────────────────────────────────────

/// Arrival bucket for a present day with a punch-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Punctuality {
    OnTime,
    Late,
    TooLate,
}

/// Thresholds used to bucket punch-in times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctualityPolicy {
    /// Expected arrival time.
    pub shift_start: NaiveTime,
    /// Minutes after `shift_start` still counted as merely late.
    pub grace_minutes: i64,
}

impl Default for PunctualityPolicy {
    fn default() -> Self {
        Self {
            shift_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            grace_minutes: 10,
        }
    }
}

// ── MonthlyStats ──────────────────────────────────────────────────────────────

/// Month-level roll-up for one employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub present: u32,
    pub absent: u32,
    pub on_time: u32,
    pub late: u32,
    pub too_late: u32,
    /// Decimal hours accumulated over present days.
    pub total_hours: f64,
}

impl MonthlyStats {
    /// `present / (present + absent)` as a percentage with one decimal.
    pub fn attendance_rate(&self) -> f64 {
        crate::formatting::percentage(
            f64::from(self.present),
            f64::from(self.present + self.absent),
            1,
        )
    }

    /// Mean worked hours per present day; `0.0` when nobody was present.
    pub fn average_hours(&self) -> f64 {
        if self.present == 0 {
            return 0.0;
        }
        self.total_hours / f64::from(self.present)
    }

    /// Add another employee's counters into this one.
    pub fn merge(&mut self, other: &MonthlyStats) {
        self.present += other.present;
        self.absent += other.absent;
        self.on_time += other.on_time;
        self.late += other.late;
        self.too_late += other.too_late;
        self.total_hours += other.total_hours;
    }
}

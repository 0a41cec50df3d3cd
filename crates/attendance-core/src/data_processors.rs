use serde_json::Value;

use crate::models::{AttendanceRecord, AttendanceStatus, WorkedHours};
use crate::time_utils::TimezoneHandler;

// ── RecordConverter ───────────────────────────────────────────────────────────

/// Converts raw JSON attendance objects into [`AttendanceRecord`]s.
///
/// Exports from different backends disagree on key spelling, so each field
/// is looked up under several alternative names; the first non-null value
/// wins. Conversion never fails: unusable values become `None`, `Unknown`
/// or `0.0` as documented on the record fields.
pub struct RecordConverter {
    tz: TimezoneHandler,
}

const DATE_KEYS: &[&str] = &["date", "attendanceDate", "attendance_date", "day"];
const STATUS_KEYS: &[&str] = &["status", "attendanceStatus", "attendance_status"];
const PUNCH_IN_KEYS: &[&str] = &["punchIn", "punch_in", "checkIn", "check_in"];
const PUNCH_OUT_KEYS: &[&str] = &["punchOut", "punch_out", "checkOut", "check_out"];
const HOURS_KEYS: &[&str] = &["totalHours", "total_hours", "hours"];
const EMPLOYEE_KEYS: &[&str] = &["employeeId", "employee_id", "empId", "userId", "user_id"];

static NULL: Value = Value::Null;

impl RecordConverter {
    pub fn new(tz: TimezoneHandler) -> Self {
        Self { tz }
    }

    /// Convert one raw object. Non-object values yield `None`.
    pub fn convert(&self, data: &Value) -> Option<AttendanceRecord> {
        if !data.is_object() {
            return None;
        }

        let date = self.tz.parse_calendar_date(Self::find(data, DATE_KEYS));
        let status = AttendanceStatus::normalize(Self::find(data, STATUS_KEYS).as_str());
        let punch_in = self.tz.parse_punch(Self::find(data, PUNCH_IN_KEYS));
        let punch_out = self.tz.parse_punch(Self::find(data, PUNCH_OUT_KEYS));
        let total_hours = WorkedHours::parse(Self::find(data, HOURS_KEYS));
        let employee_id = Self::employee_id(Self::find(data, EMPLOYEE_KEYS));

        Some(AttendanceRecord {
            employee_id,
            date,
            status,
            punch_in,
            punch_out,
            total_hours,
        })
    }

    /// Identifiers arrive as strings or numbers; both become strings.
    fn employee_id(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn find<'a>(obj: &'a Value, keys: &[&str]) -> &'a Value {
        keys.iter()
            .filter_map(|key| obj.get(key))
            .find(|v| !v.is_null())
            .unwrap_or(&NULL)
    }
}

impl Default for RecordConverter {
    fn default() -> Self {
        Self::new(TimezoneHandler::default())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

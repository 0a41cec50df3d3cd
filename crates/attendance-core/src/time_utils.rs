use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AttendanceError, Result};
use crate::models::Punch;

/// Timezone assumed when none is configured (IST).
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Turns raw timestamp values into wall-clock dates and times.
///
/// Every value that pins an instant (an epoch number, or a string with `Z`
/// or a UTC offset) is read on the reference timezone's wall clock, so
/// `2024-02-29T18:30:00Z` and the matching epoch number both land on
/// 2024-03-01 00:00 in IST. Naive strings and bare dates carry no offset
/// and are taken as written.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    reference_tz: Tz,
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// Unrecognised names fall back to UTC and log a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { reference_tz: tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    pub fn reference_tz(&self) -> Tz {
        self.reference_tz
    }

    /// The month containing "now" in the reference timezone.
    pub fn current_month(&self) -> YearMonth {
        YearMonth::from_date(Utc::now().with_timezone(&self.reference_tz).date_naive())
    }

    /// Parse a JSON timestamp into the wall-clock date-time it represents.
    ///
    /// Numbers are epoch milliseconds.
    pub fn wall_clock(&self, value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::String(s) => self.parse_wall_clock_str(s),
            Value::Number(n) => {
                let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
                let instant = DateTime::from_timestamp_millis(millis)?;
                Some(instant.with_timezone(&self.reference_tz).naive_local())
            }
            _ => None,
        }
    }

    /// Parse the calendar day of a record.
    ///
    /// Accepts date-only strings as well as anything [`Self::wall_clock`]
    /// understands. Returns `None` when nothing matches.
    pub fn parse_calendar_date(&self, value: &Value) -> Option<NaiveDate> {
        if let Value::String(s) = value {
            let trimmed = s.trim();
            for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
                if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
                    return Some(date);
                }
            }
        }
        let parsed = self.wall_clock(value).map(|dt| dt.date());
        if parsed.is_none() && !value.is_null() {
            debug!("unparseable record date {}", value);
        }
        parsed
    }

    /// Parse a punch-in / punch-out value.
    ///
    /// `null` and empty strings mean "no punch". Values that are present but
    /// do not parse are kept as [`Punch::Unparseable`].
    pub fn parse_punch(&self, value: &Value) -> Option<Punch> {
        match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => {
                let trimmed = s.trim();
                let time = self
                    .parse_wall_clock_str(trimmed)
                    .map(|dt| dt.time())
                    .or_else(|| parse_clock_time(trimmed));
                Some(match time {
                    Some(t) => Punch::At(t),
                    None => {
                        debug!("unparseable punch time \"{}\"", trimmed);
                        Punch::Unparseable(trimmed.to_string())
                    }
                })
            }
            Value::Number(_) => Some(match self.wall_clock(value) {
                Some(dt) => Punch::At(dt.time()),
                None => Punch::Unparseable(value.to_string()),
            }),
            other => Some(Punch::Unparseable(other.to_string())),
        }
    }

    /// Parse a timestamp string. Offset-bearing stamps are shifted into the
    /// reference timezone; naive ones are returned unchanged.
    fn parse_wall_clock_str(&self, s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{}+00:00", stripped),
            None => s.to_string(),
        };

        // RFC 3339, then offsets without a colon ("+0530").
        let instant = DateTime::parse_from_rfc3339(&normalised)
            .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"));
        if let Ok(dt) = instant {
            return Some(dt.with_timezone(&self.reference_tz).naive_local());
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];
        FMTS.iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }
}

/// Parse a bare clock time: `HH:MM`, `HH:MM:SS`, `hh:MM AM` or `hh:MM:SS PM`.
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    const FMTS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
    FMTS.iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

// ── YearMonth ─────────────────────────────────────────────────────────────────

/// A calendar month. Months are 1-based (`1` = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or_else(|| AttendanceError::InvalidMonth(format!("{}-{:02}", year, month)))
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn days_in_month(&self) -> u32 {
        match self.month() {
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(self.year()) => 29,
            2 => 28,
            _ => 31,
        }
    }

    /// The date of `day` in this month, or `None` if out of range.
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        self.first.with_day(day)
    }

    /// All dates of the month, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.days_in_month()).filter_map(|d| self.date(d))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = AttendanceError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AttendanceError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> Self {
        ym.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = AttendanceError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

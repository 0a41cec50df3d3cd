use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};
use crate::models::PunctualityPolicy;
use crate::time_utils::{parse_clock_time, TimezoneHandler, YearMonth, DEFAULT_TIMEZONE};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly attendance reports from punch-clock exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "attendance-report",
    about = "Monthly attendance reports from punch-clock exports",
    version
)]
pub struct Settings {
    /// Attendance export: a .json/.jsonl file or a directory of them
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Employee to report on (calendar view)
    #[arg(long)]
    pub employee: Option<String>,

    /// Month to report, as YYYY-MM (defaults to the current month)
    #[arg(long, value_parser = parse_month)]
    pub month: Option<YearMonth>,

    /// Report view
    #[arg(long, default_value = "calendar", value_parser = ["calendar", "team"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Reference timezone for timestamps and the current month; "auto" uses the system zone
    #[arg(long, default_value = DEFAULT_TIMEZONE, value_parser = parse_timezone)]
    pub timezone: String,

    /// Time format for punch times
    #[arg(long, default_value = "12h", value_parser = ["12h", "24h"])]
    pub time_format: String,

    /// Expected arrival time, HH:MM
    #[arg(long, default_value = "09:30", value_parser = parse_shift_start)]
    pub shift_start: NaiveTime,

    /// Minutes after shift start still counted as late rather than too late
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(i64).range(0..=240))]
    pub grace_minutes: i64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

fn parse_month(s: &str) -> Result<YearMonth> {
    s.parse()
}

fn parse_shift_start(s: &str) -> Result<NaiveTime> {
    parse_clock_time(s).ok_or_else(|| AttendanceError::InvalidTime(s.to_string()))
}

fn parse_timezone(s: &str) -> Result<String> {
    if s == "auto" || TimezoneHandler::validate_timezone(s) {
        Ok(s.to_string())
    } else {
        Err(AttendanceError::Config(format!("unknown timezone \"{}\"", s)))
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.attendance-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_minutes: Option<i64>,
}

impl LastUsedParams {
    /// Default location: `~/.attendance-report/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".attendance-report").join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or corrupt.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, merge with last-used params and persist.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Parse `args`, fill anything not given on the command line from the
    /// file at `config_path`, resolve `"auto"` values and save the result.
    ///
    /// `month` and the logging flags are never persisted.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        if settings.records.is_none() {
            settings.records = last.records;
        }
        if settings.employee.is_none() {
            settings.employee = last.employee;
        }
        // clap keys args by field name, not by the hyphenated flag.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "time_format") {
            if let Some(v) = last.time_format {
                settings.time_format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "shift_start") {
            if let Some(t) = last.shift_start.as_deref().and_then(parse_clock_time) {
                settings.shift_start = t;
            }
        }
        if !is_arg_explicitly_set(&matches, "grace_minutes") {
            if let Some(v) = last.grace_minutes {
                settings.grace_minutes = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!("could not save settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// Resolve the `"auto"` timezone and apply `--debug`.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn policy(&self) -> PunctualityPolicy {
        PunctualityPolicy {
            shift_start: self.shift_start,
            grace_minutes: self.grace_minutes,
        }
    }

    pub fn timezone_handler(&self) -> TimezoneHandler {
        TimezoneHandler::new(&self.timezone)
    }

    /// `--month`, or the current month in the configured timezone.
    pub fn target_month(&self) -> YearMonth {
        self.month
            .unwrap_or_else(|| self.timezone_handler().current_month())
    }

    pub fn use_12h(&self) -> bool {
        self.time_format == "12h"
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            records: s.records.clone(),
            employee: s.employee.clone(),
            view: Some(s.view.clone()),
            format: Some(s.format.clone()),
            timezone: Some(s.timezone.clone()),
            time_format: Some(s.time_format.clone()),
            shift_start: Some(s.shift_start.format("%H:%M").to_string()),
            grace_minutes: Some(s.grace_minutes),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

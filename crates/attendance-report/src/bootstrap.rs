use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.attendance-report/` and its `records/` subdirectory exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

fn ensure_directories_in(home: &Path) -> anyhow::Result<()> {
    let app_dir = home.join(".attendance-report");
    std::fs::create_dir_all(app_dir.join("records"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber, writing to stderr so that
/// stdout carries only the report.
///
/// Python-style level names are accepted; unknown levels fall back to `info`.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(normalise_level(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

fn normalise_level(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate an attendance export when `--records` was not given.
///
/// Checks, in order: `./attendance.json`, `./attendance/`,
/// `~/.attendance-report/records/` (only when it holds any file).
pub fn discover_data_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let cwd = std::env::current_dir().ok()?;
    discover_data_path_in(&home, &cwd)
}

fn discover_data_path_in(home: &Path, cwd: &Path) -> Option<PathBuf> {
    let local_file = cwd.join("attendance.json");
    if local_file.is_file() {
        return Some(local_file);
    }
    let local_dir = cwd.join("attendance");
    if local_dir.is_dir() {
        return Some(local_dir);
    }
    let records = home.join(".attendance-report").join("records");
    let has_files = std::fs::read_dir(&records)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    has_files.then_some(records)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the I/O-facing parts of the attendance toolkit.
///
/// The aggregator itself never fails; these cover loading records,
/// parsing command-line values and persisting settings.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or serialized.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The records path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No `.json` / `.jsonl` record files were found under the given path.
    #[error("No attendance files found in {0}")]
    NoDataFiles(PathBuf),

    /// A `YYYY-MM` value or a year/month pair is out of range.
    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    /// A clock time such as a shift start could not be parsed.
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error that does not carry a path, e.g. while saving settings.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the attendance crates.
pub type Result<T> = std::result::Result<T, AttendanceError>;

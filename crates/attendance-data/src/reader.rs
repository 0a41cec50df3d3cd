//! Attendance export discovery and loading.
//!
//! Reads `.json` documents (an array of records, or an object wrapping one
//! under `records` / `data`) and `.jsonl` files (one record per line) and
//! converts them into [`AttendanceRecord`]s.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use attendance_core::data_processors::RecordConverter;
use attendance_core::error::{AttendanceError, Result};
use attendance_core::models::AttendanceRecord;
use attendance_core::time_utils::TimezoneHandler;
use serde_json::Value;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// List the record files at `path`, sorted.
///
/// A file is returned as-is whatever its extension; a directory is walked
/// recursively for `.json` and `.jsonl` files.
pub fn find_record_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    if !path.exists() {
        warn!("Data path does not exist: {}", path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_record_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every record under `path`, sorted by date (undated records last).
///
/// When `path` names a single file, failing to read or parse it is an error.
/// While walking a directory, such files are skipped with a warning. JSONL
/// lines that are not valid JSON are always skipped.
pub fn load_records(path: &Path, tz: TimezoneHandler) -> Result<Vec<AttendanceRecord>> {
    if !path.exists() {
        return Err(AttendanceError::DataPathNotFound(path.to_path_buf()));
    }

    let files = find_record_files(path);
    if files.is_empty() {
        return Err(AttendanceError::NoDataFiles(path.to_path_buf()));
    }

    let converter = RecordConverter::new(tz);
    let mut records = if path.is_file() {
        process_single_file(path, &converter)?
    } else {
        let mut all: Vec<AttendanceRecord> = Vec::new();
        for file in &files {
            match process_single_file(file, &converter) {
                Ok(loaded) => all.extend(loaded),
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }
        all
    };

    records.sort_by_key(|r| (r.date.is_none(), r.date));

    debug!(
        "Loaded {} attendance records from {} files",
        records.len(),
        files.len()
    );

    Ok(records)
}

/// Extract records from an already-parsed JSON document.
pub fn records_from_document(document: &Value, converter: &RecordConverter) -> Vec<AttendanceRecord> {
    let items = match document {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => match document.get("records").or_else(|| document.get("data")) {
            Some(Value::Array(items)) => items.as_slice(),
            // A lone object is a single record.
            _ => std::slice::from_ref(document),
        },
        _ => &[],
    };
    items
        .iter()
        .filter_map(|item| converter.convert(item))
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_record_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "json" || ext == "jsonl")
        .unwrap_or(false)
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().map(|ext| ext == "jsonl").unwrap_or(false)
}

fn process_single_file(
    file_path: &Path,
    converter: &RecordConverter,
) -> Result<Vec<AttendanceRecord>> {
    let file = std::fs::File::open(file_path).map_err(|source| AttendanceError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    if !is_jsonl(file_path) {
        let document: Value = serde_json::from_reader(reader)?;
        return Ok(records_from_document(&document, converter));
    }

    let mut records = Vec::new();
    let mut skipped = 0u64;
    for line_result in reader.lines() {
        let Ok(line) = line_result else {
            skipped += 1;
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(data) => match converter.convert(&data) {
                Some(record) => records.push(record),
                None => skipped += 1,
            },
            Err(e) => {
                debug!("Failed to parse JSON line in {}: {}", file_path.display(), e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unusable line(s) in {}", skipped, file_path.display());
    }
    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! JSON-lines loaders for the runner inputs.
//!
//! The upstream parsing stages export converted audit event tables and
//! behavior windows as JSON lines, one record per line. Blank lines are
//! tolerated; a malformed line is an error carrying its line number.

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;
use wsal_core::{AuditEvent, BehaviorWindow, EventTable};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("bad record at {path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}

fn load_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, InputError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| InputError::Parse {
            path: path.display().to_string(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load one converted audit event table; rows are sorted on construction.
pub fn load_events(path: &Path) -> Result<EventTable, InputError> {
    let rows: Vec<AuditEvent> = load_lines(path)?;
    Ok(EventTable::new(rows))
}

/// Load the ground-truth behavior windows of one iteration, in file order.
pub fn load_windows(path: &Path) -> Result<Vec<BehaviorWindow>, InputError> {
    load_lines(path)
}

//! Append-only completion log
//!
//! As each job finishes, one self-contained JSON line is appended here:
//! `{"target":"Bolt.jpg","status":"done"}`. The log is never rewritten in
//! place — a job that failed and later succeeded simply has two records, and
//! [`load`] folds them last-write-wins. Appends happen strictly after the
//! corresponding file write is complete, so the log never claims `done` for
//! bytes that were never renamed into place; the reconciler still treats the
//! filesystem as ground truth for the converse case.
//!
//! Single-writer discipline is the caller's responsibility: the executor
//! serializes appends behind one mutex so records are never interleaved.

use crate::error::Result;
use crate::types::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name the executor uses for the log inside an output directory
pub const STATE_LOG_FILE: &str = "download_state.jsonl";

/// Errors longer than this are truncated before being logged
const MAX_ERROR_LEN: usize = 300;

/// One record in the completion log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    /// Target file name the record refers to
    pub target: String,
    /// Outcome of the attempt
    pub status: Outcome,
    /// Error message for failed attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle for appending completion records to one log file
#[derive(Debug)]
pub struct CompletionLog {
    path: PathBuf,
}

impl CompletionLog {
    /// Create a log handle for `path` (the file is created on first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this log appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, flushing before returning
    ///
    /// Error messages are truncated to a fixed length so a pathological
    /// upstream error cannot bloat the log.
    pub fn append(&self, target: &str, status: Outcome, error: Option<&str>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let record = CompletionRecord {
            target: target.to_string(),
            status,
            error: error.map(truncate_error),
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LEN {
        return error.to_string();
    }
    // Truncate on a char boundary
    let mut end = MAX_ERROR_LEN;
    while !error.is_char_boundary(end) {
        end -= 1;
    }
    error[..end].to_string()
}

/// Load a completion log, folding records last-write-wins per target
///
/// A missing file is an empty map. Unparsable lines are skipped with a
/// warning rather than failing the load: a crash mid-append can leave a torn
/// final line, and that must not poison every later run.
pub fn load(path: &Path) -> Result<HashMap<String, CompletionRecord>> {
    let mut map = HashMap::new();
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(map),
        Err(e) => return Err(e.into()),
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CompletionRecord>(line) {
            Ok(record) => {
                map.insert(record.target.clone(), record);
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparsable completion log line");
            }
        }
    }
    Ok(map)
}

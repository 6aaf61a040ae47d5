//! Job ledger persistence
//!
//! The ledger is the durable list of jobs for one collection: a csv file
//! with an explicit header row and one row per job, safe to inspect or edit
//! between runs. It is the source of truth for *what should exist*; only the
//! `status` and `error` columns change between runs (and only via
//! [`store`]'s whole-file rewrite — rows are never patched in place).
//!
//! Loading is strict about structure (a malformed row fails the load) but
//! lenient about status values: an unrecognized or missing status parses as
//! `pending`, so a hand-edited ledger degrades to re-fetching rather than
//! becoming unreadable.

use crate::error::{Error, Result};
use crate::types::Job;
use std::path::Path;

/// Ledger column names, in row order (must match the `Job` field order)
const COLUMNS: [&str; 9] = [
    "collection",
    "record_id",
    "layout",
    "face",
    "image_url",
    "target",
    "rotate",
    "status",
    "error",
];

/// Load a ledger from `path`
///
/// Returns `Error::Ledger` for a missing file (callers that want
/// build-if-absent semantics should check existence first, see
/// [`crate::manifest::ensure_manifest`]) and `Error::Csv` for malformed rows.
pub fn load(path: &Path) -> Result<Vec<Job>> {
    if !path.exists() {
        return Err(Error::Ledger(format!(
            "ledger not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut jobs = Vec::new();
    for row in reader.deserialize() {
        let job: Job = row?;
        jobs.push(job);
    }
    Ok(jobs)
}

/// Store a ledger to `path`, replacing any existing file
///
/// The whole file is written in one pass, header first; parent directories
/// are created as needed. This is always called by a single owner (the
/// manifest builder once, or the executor after all workers have joined).
pub fn store(path: &Path, jobs: &[Job]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if jobs.is_empty() {
        // serialize() only emits the header alongside the first row; an
        // empty collection still gets a well-formed, header-only ledger
        writer.write_record(COLUMNS)?;
    }
    for job in jobs {
        writer.serialize(job)?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobStatus, RotateHint};
    use tempfile::TempDir;

    fn sample_job(target: &str) -> Job {
        Job {
            collection: "ABC".into(),
            record_id: "rec-1".into(),
            layout: "normal".into(),
            face: 1,
            image_url: "https://img.example/a.jpg".into(),
            target: target.into(),
            rotate: RotateHint::None,
            status: JobStatus::Pending,
            error: String::new(),
        }
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");

        let jobs = vec![sample_job("Bolt.jpg"), {
            let mut j = sample_job("Flip2.jpg");
            j.face = 2;
            j.rotate = RotateHint::Rot180;
            j.status = JobStatus::Failed;
            j.error = "HTTP status 503".into();
            j
        }];

        store(&path, &jobs).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, jobs);
    }

    #[test]
    fn store_writes_header_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");
        store(&path, &[sample_job("Bolt.jpg")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "collection,record_id,layout,face,image_url,target,rotate,status,error"
        );
    }

    #[test]
    fn names_with_commas_and_quotes_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");

        let mut job = sample_job("Borrowing 100,000 Arrows.jpg");
        job.error = "server said \"no\"".into();
        store(&path, std::slice::from_ref(&job)).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded[0].target, "Borrowing 100,000 Arrows.jpg");
        assert_eq!(loaded[0].error, "server said \"no\"");
    }

    #[test]
    fn missing_status_value_defaults_to_pending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");
        std::fs::write(
            &path,
            "collection,record_id,layout,face,image_url,target,rotate,status,error\n\
             ABC,rec-1,normal,1,https://img.example/a.jpg,Bolt.jpg,,,\n",
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded[0].status, JobStatus::Pending);
    }

    #[test]
    fn unknown_status_value_defaults_to_pending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");
        std::fs::write(
            &path,
            "collection,record_id,layout,face,image_url,target,rotate,status,error\n\
             ABC,rec-1,normal,1,https://img.example/a.jpg,Bolt.jpg,,downloading,\n",
        )
        .unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded[0].status, JobStatus::Pending);
    }

    #[test]
    fn malformed_row_is_a_fatal_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ABC.csv");
        // face column holds a non-numeric value
        std::fs::write(
            &path,
            "collection,record_id,layout,face,image_url,target,rotate,status,error\n\
             ABC,rec-1,normal,first,https://img.example/a.jpg,Bolt.jpg,,pending,\n",
        )
        .unwrap();

        assert!(matches!(load(&path), Err(Error::Csv(_))));
    }

    #[test]
    fn load_missing_file_is_a_ledger_error() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(Error::Ledger(_))));
    }

    #[test]
    fn store_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifests").join("ABC.csv");
        store(&path, &[sample_job("Bolt.jpg")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn store_empty_manifest_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EMPTY.csv");
        store(&path, &[]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("collection,record_id,"));

        let loaded = load(&path).unwrap();
        assert!(loaded.is_empty());
    }
}

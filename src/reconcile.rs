//! Reconciler: merging ledger, completion log and filesystem truth
//!
//! The merge rule is deliberately asymmetric. A non-empty file on disk means
//! the artifact exists, whatever the ledger or log claim — a crash between
//! rename and log append is healed here. A `done` log record whose file is
//! missing or empty means the artifact was lost after being recorded, and
//! the job must be redone — filesystem absence always overrides a stale
//! claim. This pair of rules is what makes resume after a crash safe in both
//! directions.

use crate::state_log::CompletionRecord;
use crate::types::{Job, JobStatus, Outcome};
use std::collections::HashMap;
use std::path::Path;

/// Canonical classification of one job before (or after) a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// The artifact exists; nothing to do
    Done,
    /// The artifact must be (re)fetched
    Pending,
}

/// True when the job's target exists on disk with non-zero size
pub fn target_exists(job: &Job, output_dir: &Path) -> bool {
    let path = output_dir.join(&job.target);
    match std::fs::metadata(&path) {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Classify a job as done or pending
///
/// Priority order:
/// 1. target file exists non-empty on disk → `Done` (disk is ground truth);
/// 2. otherwise → `Pending`, even if the completion log says `done` — a
///    state/file mismatch means the file was lost and must be redone.
///
/// The completion map parameter exists so callers can log the mismatch; the
/// classification itself never trusts the log over the filesystem.
pub fn classify(
    job: &Job,
    output_dir: &Path,
    completion_map: &HashMap<String, CompletionRecord>,
) -> JobState {
    if target_exists(job, output_dir) {
        return JobState::Done;
    }

    if let Some(record) = completion_map.get(&job.target)
        && record.status == Outcome::Done
    {
        tracing::warn!(
            target = %job.target,
            "completion log claims done but file is missing or empty, re-dispatching"
        );
    }

    JobState::Pending
}

/// Recompute a job's persisted status for the end-of-run ledger rewrite
///
/// Returns the `(status, error)` pair the ledger row should carry:
/// - file present non-empty → `done` with no error;
/// - log says `failed` → `failed`, keeping the recorded error;
/// - otherwise → `pending` (including the stale-`done` case).
pub fn recompute(
    job: &Job,
    output_dir: &Path,
    completion_map: &HashMap<String, CompletionRecord>,
) -> (JobStatus, String) {
    if target_exists(job, output_dir) {
        return (JobStatus::Done, String::new());
    }

    match completion_map.get(&job.target) {
        Some(record) if record.status == Outcome::Failed => {
            let error = record
                .error
                .clone()
                .unwrap_or_else(|| job.error.clone());
            (JobStatus::Failed, error)
        }
        _ => (JobStatus::Pending, String::new()),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RotateHint;
    use tempfile::TempDir;

    fn job(target: &str) -> Job {
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

    fn done_record(target: &str) -> (String, CompletionRecord) {
        (
            target.to_string(),
            CompletionRecord {
                target: target.to_string(),
                status: Outcome::Done,
                error: None,
            },
        )
    }

    fn failed_record(target: &str, error: &str) -> (String, CompletionRecord) {
        (
            target.to_string(),
            CompletionRecord {
                target: target.to_string(),
                status: Outcome::Failed,
                error: Some(error.to_string()),
            },
        )
    }

    #[test]
    fn file_on_disk_is_done_regardless_of_log() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Bolt.jpg"), b"bytes").unwrap();

        // No log entry at all: still done
        let map = HashMap::new();
        assert_eq!(classify(&job("Bolt.jpg"), dir.path(), &map), JobState::Done);

        // Log says failed: disk wins
        let map: HashMap<_, _> = [failed_record("Bolt.jpg", "timeout")].into();
        assert_eq!(classify(&job("Bolt.jpg"), dir.path(), &map), JobState::Done);
    }

    #[test]
    fn missing_file_is_pending_even_when_log_says_done() {
        let dir = TempDir::new().unwrap();
        let map: HashMap<_, _> = [done_record("Bolt.jpg")].into();
        assert_eq!(
            classify(&job("Bolt.jpg"), dir.path(), &map),
            JobState::Pending
        );
    }

    #[test]
    fn zero_byte_file_is_pending() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Bolt.jpg"), b"").unwrap();

        let map: HashMap<_, _> = [done_record("Bolt.jpg")].into();
        assert_eq!(
            classify(&job("Bolt.jpg"), dir.path(), &map),
            JobState::Pending
        );
    }

    #[test]
    fn leftover_part_file_does_not_satisfy_the_target() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Bolt.jpg.part"), b"half written").unwrap();
        assert_eq!(
            classify(&job("Bolt.jpg"), dir.path(), &HashMap::new()),
            JobState::Pending
        );
    }

    #[test]
    fn no_file_no_log_is_pending() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            classify(&job("Bolt.jpg"), dir.path(), &HashMap::new()),
            JobState::Pending
        );
    }

    #[test]
    fn recompute_file_present_is_done_and_clears_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Bolt.jpg"), b"bytes").unwrap();

        let mut j = job("Bolt.jpg");
        j.status = JobStatus::Failed;
        j.error = "old error".into();

        let (status, error) = recompute(&j, dir.path(), &HashMap::new());
        assert_eq!(status, JobStatus::Done);
        assert!(error.is_empty());
    }

    #[test]
    fn recompute_logged_failure_keeps_error() {
        let dir = TempDir::new().unwrap();
        let map: HashMap<_, _> = [failed_record("Bolt.jpg", "HTTP status 503")].into();

        let (status, error) = recompute(&job("Bolt.jpg"), dir.path(), &map);
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(error, "HTTP status 503");
    }

    #[test]
    fn recompute_stale_done_claim_becomes_pending() {
        let dir = TempDir::new().unwrap();
        let map: HashMap<_, _> = [done_record("Bolt.jpg")].into();

        let (status, error) = recompute(&job("Bolt.jpg"), dir.path(), &map);
        assert_eq!(status, JobStatus::Pending);
        assert!(error.is_empty());
    }

    #[test]
    fn recompute_untouched_job_is_pending() {
        let dir = TempDir::new().unwrap();
        let (status, _) = recompute(&job("Bolt.jpg"), dir.path(), &HashMap::new());
        assert_eq!(status, JobStatus::Pending);
    }
}

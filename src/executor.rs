//! Fetch executor
//!
//! Takes a ledger, figures out which jobs still need fetching, and runs them
//! against the image host with bounded concurrency. Every satisfied job is
//! skipped without touching the network, every fetched file is written
//! atomically (`<target>.part` then rename), and every outcome is appended
//! to the completion log before the run's final ledger rewrite.
//!
//! Cancellation is cooperative: cancelling the token stops new dispatch and
//! releases jobs still queued for a worker permit, but jobs already in
//! flight run to completion so no half-written state is left behind. The
//! end-of-run ledger rewrite happens on every exit path.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::ledger;
use crate::post_processing::{NoOpPostProcessor, PostProcessor};
use crate::reconcile::{self, JobState};
use crate::retry::download_with_retry;
use crate::state_log::{self, CompletionLog, STATE_LOG_FILE};
use crate::types::{Job, Outcome, RunSummary};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Concurrent, resumable download driver for one ledger
pub struct FetchExecutor {
    client: reqwest::Client,
    config: FetchConfig,
    post_processor: Arc<dyn PostProcessor>,
    cancel: CancellationToken,
}

impl FetchExecutor {
    /// Build an executor with the pass-through post-processor
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.download_timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            post_processor: Arc::new(NoOpPostProcessor),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the post-processor applied between fetch and write
    pub fn with_post_processor(mut self, processor: Arc<dyn PostProcessor>) -> Self {
        self.post_processor = processor;
        self
    }

    /// Token that stops dispatch of new jobs when cancelled
    ///
    /// Jobs waiting for a worker permit are released and stay pending;
    /// in-flight jobs finish; the final ledger rewrite still runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every pending job in the ledger at `ledger_path`
    ///
    /// `concurrency` overrides the configured worker count for this run;
    /// zero is promoted to one. Must not be invoked concurrently for the
    /// same ledger: the ledger rewrite and the completion log both assume a
    /// single executor owns them for the duration of a run.
    pub async fn run(
        &self,
        ledger_path: &Path,
        output_dir: &Path,
        concurrency: Option<usize>,
    ) -> Result<RunSummary> {
        let mut jobs = ledger::load(ledger_path)?;
        std::fs::create_dir_all(output_dir)?;

        let log_path = output_dir.join(STATE_LOG_FILE);
        let completion_map = state_log::load(&log_path)?;

        let mut summary = RunSummary::default();
        let mut pending = Vec::new();
        for (index, job) in jobs.iter().enumerate() {
            match reconcile::classify(job, output_dir, &completion_map) {
                JobState::Done => summary.skipped += 1,
                JobState::Pending => pending.push(index),
            }
        }

        tracing::info!(
            total = jobs.len(),
            pending = pending.len(),
            skipped = summary.skipped,
            "starting fetch run"
        );

        if pending.is_empty() {
            // Nothing to fetch; still fold log and disk back into the ledger
            self.rewrite_ledger(ledger_path, output_dir, &log_path, &mut jobs)?;
            return Ok(summary);
        }

        let workers = concurrency
            .unwrap_or(self.config.max_concurrent_fetches)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let log = Arc::new(Mutex::new(CompletionLog::new(&log_path)));
        let mut join_set: JoinSet<(usize, Result<()>)> = JoinSet::new();

        for index in pending {
            if self.cancel.is_cancelled() {
                tracing::info!("cancellation requested, remaining jobs left pending");
                break;
            }

            let job = jobs[index].clone();
            let client = self.client.clone();
            let retry = self.config.retry.clone();
            let processor = Arc::clone(&self.post_processor);
            let log = Arc::clone(&log);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let output_dir = output_dir.to_path_buf();

            join_set.spawn(async move {
                // A job is only "in flight" once it holds a worker permit.
                // Jobs still queued on the semaphore when the token fires
                // are released without fetching, so cancellation takes
                // effect mid-run and not just before dispatch.
                let permit = tokio::select! {
                    permit = semaphore.acquire_owned() => permit,
                    () = cancel.cancelled() => return (index, Err(Error::Cancelled)),
                };
                if permit.is_err() {
                    return (index, Err(Error::Cancelled));
                }

                let result = fetch_one(&client, &retry, processor.as_ref(), &job, &output_dir).await;

                let (outcome, error) = match &result {
                    Ok(()) => (Outcome::Done, None),
                    Err(e) => (Outcome::Failed, Some(e.to_string())),
                };
                let log = log.lock().await;
                if let Err(e) = log.append(&job.target, outcome, error.as_deref()) {
                    // The file (if any) is already renamed into place; the
                    // reconciler recovers the missing record from disk
                    tracing::error!(target = %job.target, error = %e, "completion log append failed");
                }

                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(()))) => {
                    summary.succeeded += 1;
                    tracing::debug!(target = %jobs[index].target, "fetched");
                }
                Ok((index, Err(Error::Cancelled))) => {
                    // Never dispatched; the job stays pending in the ledger
                    tracing::debug!(target = %jobs[index].target, "job released by cancellation");
                }
                Ok((index, Err(e))) => {
                    summary.failed += 1;
                    tracing::warn!(target = %jobs[index].target, error = %e, "fetch failed");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(error = %e, "fetch task panicked");
                }
            }
        }

        self.rewrite_ledger(ledger_path, output_dir, &log_path, &mut jobs)?;

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "fetch run finished"
        );
        Ok(summary)
    }

    /// Fold filesystem and completion log truth back into the ledger rows
    /// and rewrite the file once
    fn rewrite_ledger(
        &self,
        ledger_path: &Path,
        output_dir: &Path,
        log_path: &Path,
        jobs: &mut [Job],
    ) -> Result<()> {
        let completion_map = state_log::load(log_path)?;
        for job in jobs.iter_mut() {
            let (status, error) = reconcile::recompute(job, output_dir, &completion_map);
            job.status = status;
            job.error = error;
        }
        ledger::store(ledger_path, jobs)
    }
}

impl std::fmt::Debug for FetchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchExecutor")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Fetch, post-process and atomically write one job's target file
async fn fetch_one(
    client: &reqwest::Client,
    retry: &crate::config::RetryConfig,
    processor: &dyn PostProcessor,
    job: &Job,
    output_dir: &Path,
) -> Result<()> {
    let bytes = download_with_retry(retry, || async move {
        let response = client.get(&job.image_url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(job.image_url.clone()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                code: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    })
    .await?;

    let bytes = processor.apply(bytes, job.rotate)?;

    // Write to a sibling .part file first so a crash mid-write can never
    // leave a plausible-looking final file behind
    let final_path = output_dir.join(&job.target);
    let part_path = output_dir.join(format!("{}.part", job.target));
    tokio::fs::write(&part_path, &bytes).await?;
    tokio::fs::rename(&part_path, &final_path).await?;

    Ok(())
}

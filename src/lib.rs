//! # cardfetch
//!
//! Manifest-driven, resumable bulk downloader for card image collections.
//!
//! ## Design Philosophy
//!
//! cardfetch is designed to be:
//! - **Resumable** - a run can die at any point and the next run picks up
//!   exactly the missing files, never re-downloading what is already on disk
//! - **Manifest-first** - the full job list is computed and persisted before
//!   the first byte is fetched, so the work plan is inspectable and durable
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardfetch::{
//!     CatalogConfig, FetchConfig, FetchExecutor, ScryfallClient, ensure_manifest,
//!     naming::collection_dir_name,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ScryfallClient::new(CatalogConfig::default())?;
//!     let ledger = Path::new("manifests/ONE.csv");
//!     ensure_manifest(&catalog, "one", ledger).await?;
//!
//!     let output_dir = Path::new("images").join(collection_dir_name("one"));
//!     let executor = FetchExecutor::new(FetchConfig::default())?;
//!     let summary = executor.run(ledger, &output_dir, None).await?;
//!     println!(
//!         "done: {} fetched, {} failed, {} already present",
//!         summary.succeeded, summary.failed, summary.skipped
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog search client
pub mod catalog;
/// Configuration types
pub mod config;
/// Record-to-image fan-out rules
pub mod descriptor;
/// Error types
pub mod error;
/// Concurrent fetch executor
pub mod executor;
/// Job ledger persistence (csv)
pub mod ledger;
/// Manifest builder
pub mod manifest;
/// Naming resolver
pub mod naming;
/// Post-processing seam for fetched bytes
pub mod post_processing;
/// Reconciliation of ledger, log and filesystem
pub mod reconcile;
/// Retry logic with exponential backoff
pub mod retry;
/// Append-only completion log (jsonl)
pub mod state_log;
/// Core types
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogPage, ScryfallClient};
pub use config::{CatalogConfig, FetchConfig, RetryConfig};
pub use error::{Error, Result};
pub use executor::FetchExecutor;
pub use manifest::{build_manifest, ensure_manifest};
pub use post_processing::{NoOpPostProcessor, PostProcessor};
pub use state_log::{CompletionLog, CompletionRecord, STATE_LOG_FILE};
pub use types::{
    CardRecord, ImageDescriptor, Job, JobStatus, Outcome, RotateHint, RunSummary,
};

/// Cancel `token` when the process receives a termination signal.
///
/// Spawn-and-forget companion to [`FetchExecutor::cancellation_token`]: the
/// executor stops dispatching new jobs once the token is cancelled, finishes
/// what is in flight, and rewrites the ledger before returning.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use cardfetch::{FetchConfig, FetchExecutor, cancel_on_signal};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let executor = FetchExecutor::new(FetchConfig::default())?;
///     tokio::spawn(cancel_on_signal(executor.cancellation_token()));
///
///     executor
///         .run(Path::new("manifests/ONE.csv"), Path::new("images/ONE"), None)
///         .await?;
///     Ok(())
/// }
/// ```
pub async fn cancel_on_signal(token: tokio_util::sync::CancellationToken) {
    wait_for_signal().await;
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

//! Diagnostic events emitted while a batch runs.
//!
//! Runners never print. They hand events to a [`PipelineObserver`], which can
//! log them, draw a progress bar, or ignore them. Observers are shared by every
//! stage worker and are called concurrently.

use std::path::Path;
use std::time::Duration;

use crate::types::{BatchReport, ItemOutcome, Rejection};

/// Receives diagnostic events from the runners.
///
/// Every method has a no-op default so implementors pick only what they need.
pub trait PipelineObserver: Send + Sync {
    /// A candidate path failed validation and was skipped.
    fn input_rejected(&self, _rejection: &Rejection) {}

    /// A stage finished with one item, successfully or not.
    fn stage_completed(&self, _stage: &str, _path: &Path, _elapsed: Duration) {}

    /// An admitted item left the last stage (or failed on the way).
    fn item_finished(&self, _outcome: &ItemOutcome) {}

    /// The batch is over; `report.elapsed` covers the whole run.
    fn batch_finished(&self, _report: &BatchReport) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn input_rejected(&self, rejection: &Rejection) {
        tracing::warn!("{}", rejection);
    }

    fn stage_completed(&self, stage: &str, path: &Path, elapsed: Duration) {
        tracing::debug!(stage, path = %path.display(), "{} stage took {:?}", stage, elapsed);
    }

    fn item_finished(&self, outcome: &ItemOutcome) {
        match &outcome.failure {
            None => tracing::debug!("Completed {:?}", outcome.destination_path),
            Some(failure) => tracing::error!("Failed: {}", failure.message),
        }
    }

    fn batch_finished(&self, report: &BatchReport) {
        tracing::info!(
            "Total {} pipeline time: {:?} ({} succeeded, {} failed, {} rejected)",
            report.mode,
            report.elapsed,
            report.succeeded(),
            report.failed(),
            report.rejected.len()
        );
    }
}

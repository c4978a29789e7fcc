//! The completion collector: the one place a pipeline run waits.

use tokio::sync::mpsc;

use crate::observer::PipelineObserver;
use crate::types::ItemOutcome;

/// Drain the terminal hand-off until every sender is gone.
///
/// Returns the outcomes in arrival order, which is input order because every
/// stage is a single FIFO worker.
pub async fn collect(
    mut outcomes: mpsc::Receiver<ItemOutcome>,
    observer: &dyn PipelineObserver,
) -> Vec<ItemOutcome> {
    let mut collected = Vec::new();
    while let Some(outcome) = outcomes.recv().await {
        observer.item_finished(&outcome);
        collected.push(outcome);
    }
    collected
}

//! Hand-off channels and the per-stage worker that sits between them.
//!
//! Each worker owns the receiving end of its input and the sending end of its
//! output. Returning from [`StageWorker::run`] drops the sender, which is the
//! one and only way a hand-off is closed; the next worker sees the closure
//! once it has drained what was already sent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::observer::PipelineObserver;

use super::item::{Flow, Item, ItemFailure};
use super::stage::Stage;

/// Create a hand-off channel with the configured capacity.
///
/// With the default capacity of one, a producer can run at most one item ahead
/// of its consumer before `send` suspends it.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size)
}

/// What every worker of one run shares.
#[derive(Clone)]
pub struct WorkerContext {
    pub cancel: CancellationToken,
    pub observer: Arc<dyn PipelineObserver>,
    pub stage_timeout: Duration,
}

/// One long-lived worker driving a single stage.
pub struct StageWorker<O> {
    stage: Arc<dyn Stage>,
    input: mpsc::Receiver<Flow>,
    output: mpsc::Sender<O>,
}

impl<O> StageWorker<O> {
    pub fn new(stage: Arc<dyn Stage>, input: mpsc::Receiver<Flow>, output: mpsc::Sender<O>) -> Self {
        Self {
            stage,
            input,
            output,
        }
    }

    /// Run until the input is exhausted, cancellation fires, or the
    /// downstream end goes away.
    ///
    /// Live items are transformed; failed items are passed through untouched so
    /// that every admitted item still reaches the end in order. `emit` turns
    /// each flow value into this worker's output type (identity for interior
    /// stages, an outcome for the last one).
    pub async fn run<F>(mut self, ctx: WorkerContext, emit: F)
    where
        F: Fn(Flow) -> O,
    {
        tracing::trace!("{} worker started", self.stage.name());

        loop {
            let flow = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                next = self.input.recv() => match next {
                    Some(flow) => flow,
                    None => break,
                },
            };

            let flow = match flow {
                Ok(item) => match apply_stage(&self.stage, item, &ctx).await {
                    Some(flow) => flow,
                    None => break,
                },
                Err(failure) => Err(failure),
            };

            let sent = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                sent = self.output.send(emit(flow)) => sent,
            };
            if sent.is_err() {
                // Downstream closed, stop processing
                break;
            }
        }

        tracing::trace!("{} worker finished", self.stage.name());
    }
}

/// Apply one stage to one item on the blocking pool, under the stage timeout.
///
/// A stage error, a panic inside the stage, or a timeout all become an
/// `ItemFailure` for this item only. Returns `None` if the run is cancelled
/// first. On timeout or cancellation the item is abandoned, so a stage still
/// running in the background cannot publish its output; if the output was
/// already committed, the stage is awaited and its result kept.
pub async fn apply_stage(
    stage: &Arc<dyn Stage>,
    item: Item,
    ctx: &WorkerContext,
) -> Option<Flow> {
    let source_path = item.source_path().to_path_buf();
    let destination_path = item.destination_path().to_path_buf();
    let publication = item.publication().clone();
    let name = stage.name().to_string();
    let start = Instant::now();

    let task_stage = Arc::clone(stage);
    let mut task = tokio::task::spawn_blocking(move || task_stage.apply(item));
    let waited = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        joined = tokio::time::timeout(ctx.stage_timeout, &mut task) => Some(joined),
    };

    let joined = match waited {
        Some(Ok(joined)) => joined,
        // Interrupted, but the stage already committed its output
        _ if !publication.abandon() => task.await,
        None => return None,
        Some(Err(_)) => Ok(Err(PipelineError::Timeout {
            path: source_path.clone(),
            stage: name.clone(),
            timeout_ms: ctx.stage_timeout.as_millis() as u64,
        })),
    };
    ctx.observer
        .stage_completed(&name, &source_path, start.elapsed());

    let error = match joined {
        Ok(Ok(item)) => return Some(Ok(item)),
        Ok(Err(e)) => e,
        Err(e) => PipelineError::Stage {
            path: source_path.clone(),
            stage: name,
            message: format!("Task join error: {}", e),
        },
    };

    Some(Err(ItemFailure {
        source_path,
        destination_path,
        error,
    }))
}

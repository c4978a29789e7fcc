//! Batch orchestration: the sequential runner and the staged pipeline runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, PipelineConfig};
use crate::error::BatchError;
use crate::observer::{PipelineObserver, TracingObserver};
use crate::types::{BatchReport, ExecutionMode, ItemOutcome};

use super::channel::{apply_stage, bounded_channel, StageWorker, WorkerContext};
use super::collector::collect;
use super::item::{Flow, Item};
use super::source::Admission;
use super::stage::{default_stages, Stage};
use super::validate::{output_directory_exists, Validator};

/// Runs a batch of paths through an ordered list of stages.
pub struct BatchProcessor {
    pipeline: PipelineConfig,
    validator: Validator,
    stages: Vec<Arc<dyn Stage>>,
    observer: Arc<dyn PipelineObserver>,
}

impl BatchProcessor {
    /// Create a processor with the standard load/resize/grayscale/save stages.
    pub fn new(config: &Config) -> Self {
        Self::with_stages(config, default_stages(config))
    }

    /// Create a processor with a caller-supplied stage list.
    pub fn with_stages(config: &Config, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            validator: Validator::new(&config.pipeline),
            stages,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the diagnostics observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run a batch in the given mode.
    pub async fn run(
        &self,
        mode: ExecutionMode,
        paths: &[PathBuf],
        output_root: &str,
    ) -> Result<BatchReport, BatchError> {
        self.run_with_cancel(mode, paths, output_root, CancellationToken::new())
            .await
    }

    /// Run a batch in the given mode, stopping early if `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        mode: ExecutionMode,
        paths: &[PathBuf],
        output_root: &str,
        cancel: CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        match mode {
            ExecutionMode::Sequential => {
                self.run_sequential_with_cancel(paths, output_root, cancel)
                    .await
            }
            ExecutionMode::Parallel => {
                self.run_pipeline_with_cancel(paths, output_root, cancel)
                    .await
            }
        }
    }

    /// Process every path fully, one at a time.
    pub async fn run_sequential(
        &self,
        paths: &[PathBuf],
        output_root: &str,
    ) -> Result<BatchReport, BatchError> {
        self.run_sequential_with_cancel(paths, output_root, CancellationToken::new())
            .await
    }

    /// Sequential run that stops at the next stage boundary when `cancel`
    /// fires or the batch timeout expires.
    ///
    /// Each stage runs on the blocking pool under the same per-stage timeout
    /// as in a pipelined run, and the next stage starts only after it
    /// returns.
    pub async fn run_sequential_with_cancel(
        &self,
        paths: &[PathBuf],
        output_root: &str,
        cancel: CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        self.check_output_root(output_root)?;

        let start = Instant::now();
        let (ctx, timer) = self.start_run(&cancel);
        let admission = self.admission(output_root);
        let mut outcomes = Vec::new();
        let mut rejected = Vec::new();
        let mut cancelled = false;

        for path in paths {
            if ctx.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let item = match admission.admit(path) {
                Ok(item) => item,
                Err(rejection) => {
                    self.observer.input_rejected(&rejection);
                    rejected.push(rejection);
                    continue;
                }
            };

            let Some(flow) = self.apply_all(item, &ctx).await else {
                cancelled = true;
                break;
            };
            let outcome = ItemOutcome::from(flow);
            self.observer.item_finished(&outcome);
            outcomes.push(outcome);
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        let report = BatchReport {
            mode: ExecutionMode::Sequential,
            outcomes,
            rejected,
            elapsed: start.elapsed(),
            cancelled,
        };
        self.observer.batch_finished(&report);
        Ok(report)
    }

    /// Process the batch through one concurrent worker per stage.
    pub async fn run_pipeline(
        &self,
        paths: &[PathBuf],
        output_root: &str,
    ) -> Result<BatchReport, BatchError> {
        self.run_pipeline_with_cancel(paths, output_root, CancellationToken::new())
            .await
    }

    /// Pipelined run that unwinds every worker when `cancel` fires.
    ///
    /// Returns once the collector has drained the terminal hand-off and every
    /// worker has exited.
    pub async fn run_pipeline_with_cancel(
        &self,
        paths: &[PathBuf],
        output_root: &str,
        cancel: CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        self.check_output_root(output_root)?;

        let start = Instant::now();
        let (ctx, timer) = self.start_run(&cancel);
        let admission = self.admission(output_root);
        let (outcome_tx, outcome_rx) = bounded_channel::<ItemOutcome>(&self.pipeline);
        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(self.stages.len());

        let source = match self.stages.split_last() {
            None => tokio::spawn(admission.feed(
                paths.to_vec(),
                outcome_tx,
                ctx.clone(),
                ItemOutcome::from,
            )),
            Some((last, interior)) => {
                let (first_tx, mut rx) = bounded_channel::<Flow>(&self.pipeline);
                let source = tokio::spawn(admission.feed(
                    paths.to_vec(),
                    first_tx,
                    ctx.clone(),
                    std::convert::identity,
                ));
                for stage in interior {
                    let (tx, next_rx) = bounded_channel::<Flow>(&self.pipeline);
                    let worker = StageWorker::new(Arc::clone(stage), rx, tx);
                    workers.push(tokio::spawn(worker.run(ctx.clone(), std::convert::identity)));
                    rx = next_rx;
                }
                let worker = StageWorker::new(Arc::clone(last), rx, outcome_tx);
                workers.push(tokio::spawn(worker.run(ctx.clone(), ItemOutcome::from)));
                source
            }
        };
        tracing::debug!(
            "Pipeline started: {} stage worker(s) for {} path(s)",
            workers.len(),
            paths.len()
        );

        let outcomes = collect(outcome_rx, self.observer.as_ref()).await;
        let cancelled = ctx.cancel.is_cancelled();

        if let Some(timer) = timer {
            timer.abort();
        }
        let rejected = match source.await {
            Ok(rejected) => rejected,
            Err(e) => {
                tracing::error!("Source worker failed: {}", e);
                Vec::new()
            }
        };
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("Stage worker failed: {}", e);
            }
        }
        tracing::debug!("Pipeline drained, all workers exited");

        let report = BatchReport {
            mode: ExecutionMode::Parallel,
            outcomes,
            rejected,
            elapsed: start.elapsed(),
            cancelled,
        };
        self.observer.batch_finished(&report);
        Ok(report)
    }

    /// Shared context for one run, with the batch timeout armed.
    ///
    /// A child token lets the batch timeout stop this run without touching
    /// the caller's token.
    fn start_run(&self, cancel: &CancellationToken) -> (WorkerContext, Option<JoinHandle<()>>) {
        let run_token = cancel.child_token();
        let timer = self.batch_timeout().map(|limit| {
            let token = run_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!("Batch timeout of {:?} reached, cancelling", limit);
                token.cancel();
            })
        });

        let ctx = WorkerContext {
            cancel: run_token,
            observer: Arc::clone(&self.observer),
            stage_timeout: Duration::from_millis(self.pipeline.stage_timeout_ms),
        };
        (ctx, timer)
    }

    /// Apply every stage to one item, stopping at the first failure.
    ///
    /// Returns `None` if the run was cancelled before the item finished.
    async fn apply_all(&self, mut item: Item, ctx: &WorkerContext) -> Option<Flow> {
        for stage in &self.stages {
            if ctx.cancel.is_cancelled() {
                return None;
            }
            item = match apply_stage(stage, item, ctx).await? {
                Ok(next) => next,
                Err(failure) => return Some(Err(failure)),
            };
        }
        Some(Ok(item))
    }

    fn admission(&self, output_root: &str) -> Admission {
        Admission::new(self.validator.clone(), &self.pipeline.input_root, output_root)
    }

    fn batch_timeout(&self) -> Option<Duration> {
        self.pipeline.batch_timeout_ms.map(Duration::from_millis)
    }

    fn check_output_root(&self, output_root: &str) -> Result<(), BatchError> {
        if output_directory_exists(Path::new(output_root)) {
            Ok(())
        } else {
            Err(BatchError::OutputDirectoryMissing(PathBuf::from(output_root)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InvalidReason, PipelineError, PipelineResult};
    use image::DynamicImage;
    use std::sync::Mutex;

    /// Stand-in for load: attaches a tiny image without touching the file.
    struct FakeLoad;

    impl Stage for FakeLoad {
        fn name(&self) -> &str {
            "load"
        }

        fn apply(&self, item: Item) -> PipelineResult<Item> {
            Ok(item.with_payload(DynamicImage::new_luma8(2, 2)))
        }
    }

    /// Fails any item whose file name starts with "bad".
    struct Picky;

    impl Stage for Picky {
        fn name(&self) -> &str {
            "picky"
        }

        fn apply(&self, item: Item) -> PipelineResult<Item> {
            let name = item.source_path().file_name().unwrap_or_default();
            if name.to_string_lossy().starts_with("bad") {
                return Err(PipelineError::Resize {
                    path: item.source_path().to_path_buf(),
                    message: "refused".to_string(),
                });
            }
            Ok(item)
        }
    }

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<String>>,
        finished: Mutex<usize>,
    }

    impl PipelineObserver for Recorder {
        fn stage_completed(&self, stage: &str, _path: &Path, _elapsed: Duration) {
            self.stages.lock().unwrap().push(stage.to_string());
        }

        fn batch_finished(&self, _report: &BatchReport) {
            *self.finished.lock().unwrap() += 1;
        }
    }

    fn fixture(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>, String) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let out = format!("{}/out/", dir.path().display());
        let paths = names.iter().map(|n| dir.path().join(n)).collect();
        (dir, paths, out)
    }

    fn processor(stages: Vec<Arc<dyn Stage>>) -> BatchProcessor {
        BatchProcessor::with_stages(&Config::default(), stages)
    }

    #[test]
    fn test_stage_names() {
        let processor = BatchProcessor::new(&Config::default());
        assert_eq!(
            processor.stage_names(),
            vec!["load", "resize", "grayscale", "save"]
        );
    }

    #[tokio::test]
    async fn test_sequential_failure_skips_remaining_stages() {
        let (_dir, paths, out) = fixture(&["good.jpg", "bad.jpg"]);
        let recorder = Arc::new(Recorder::default());
        let processor = processor(vec![Arc::new(FakeLoad), Arc::new(Picky), Arc::new(FakeLoad)])
            .with_observer(recorder.clone());

        let report = processor.run_sequential(&paths, &out).await.unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.cancelled);
        // good: 3 stages, bad: load then the failing picky stage
        assert_eq!(
            *recorder.stages.lock().unwrap(),
            vec!["load", "picky", "load", "load", "picky"]
        );
        assert_eq!(*recorder.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_failure_does_not_stop_siblings() {
        let (_dir, paths, out) = fixture(&["a.jpg", "bad.jpg", "c.jpg"]);
        let processor = processor(vec![Arc::new(FakeLoad), Arc::new(Picky), Arc::new(FakeLoad)]);

        let report = processor.run_pipeline(&paths, &out).await.unwrap();
        let flags: Vec<bool> = report.outcomes.iter().map(|o| o.succeeded()).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[tokio::test]
    async fn test_pipeline_with_no_stages_still_terminates() {
        let (_dir, paths, out) = fixture(&["a.jpg", "b.txt"]);
        let processor = processor(Vec::new());

        let report = processor.run_pipeline(&paths, &out).await.unwrap();
        assert_eq!(report.admitted(), 1);
        assert_eq!(report.rejected[0].reason, InvalidReason::WrongExtension);
    }

    #[tokio::test]
    async fn test_missing_output_root_is_fatal() {
        let (dir, paths, _out) = fixture(&["a.jpg"]);
        let missing = format!("{}/nowhere/", dir.path().display());
        let recorder = Arc::new(Recorder::default());
        let processor = processor(vec![Arc::new(FakeLoad)]).with_observer(recorder.clone());

        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let err = processor.run(mode, &paths, &missing).await.unwrap_err();
            assert!(matches!(err, BatchError::OutputDirectoryMissing(_)));
        }
        assert!(recorder.stages.lock().unwrap().is_empty());
        assert_eq!(*recorder.finished.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_processes_nothing() {
        let (_dir, paths, out) = fixture(&["a.jpg", "b.jpg"]);
        let processor = processor(vec![Arc::new(FakeLoad)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let report = processor
                .run_with_cancel(mode, &paths, &out, cancel.clone())
                .await
                .unwrap();
            assert!(report.cancelled);
            assert_eq!(report.admitted(), 0);
        }
    }
}

//! The `imgpipe run` command for processing a batch of images.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::Style;
use imgpipe_core::pipeline::output_directory_exists;
use imgpipe_core::{
    BatchError, BatchProcessor, BatchReport, Config, ExecutionMode, FileDiscovery, Validator,
};
use tokio_util::sync::CancellationToken;

use super::console::ConsoleObserver;
use super::prompt;

/// Images processed when no paths are given.
const DEFAULT_IMAGES: [&str; 4] = [
    "images/watermelon.jpg",
    "images/apple.jpg",
    "images/blueberry.jpg",
    "images/lemon.jpg",
];

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Image files or directories to process (defaults to the bundled image set)
    pub paths: Vec<PathBuf>,

    /// Execution mode: sequential or parallel (prompted for when omitted)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Output directory (must already exist)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Input root prefix replaced by the output directory
    #[arg(long)]
    pub input_root: Option<String>,

    /// Write the batch report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

/// Execute the run command.
///
/// Batch-level problems (missing output directory, unknown mode) are printed
/// and end the command without processing anything; they are not errors.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(input_root) = &args.input_root {
        config.pipeline.input_root = input_root.clone();
    }
    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.output_dir());

    if !output_directory_exists(Path::new(&output_dir)) {
        println!("{}", BatchError::OutputDirectoryMissing(PathBuf::from(&output_dir)));
        return Ok(());
    }

    let answer = match args.mode.clone() {
        Some(mode) => mode,
        None => match prompt::ask_mode()? {
            Some(answer) => answer,
            None => return Ok(()),
        },
    };
    let mode = match answer.parse::<ExecutionMode>() {
        Ok(mode) => mode,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    println!("Running pipeline in {} mode...", mode);

    let paths = candidate_paths(&args.paths, &config);
    tracing::debug!("{} candidate path(s), output to {}", paths.len(), output_dir);

    let observer = if args.progress {
        ConsoleObserver::with_progress(paths.len() as u64)
    } else {
        ConsoleObserver::new()
    };
    let processor = BatchProcessor::new(&config).with_observer(Arc::new(observer));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping the batch");
                cancel.cancel();
            }
        })
    };

    let result = processor
        .run_with_cancel(mode, &paths, &output_dir, cancel)
        .await;
    interrupt.abort();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    if let Some(path) = &args.report {
        report.write_json(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    print_summary(&report);
    Ok(())
}

/// Default paths when none are given, with directories expanded to the
/// accepted image files inside them.
fn candidate_paths(paths: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    let inputs: Vec<PathBuf> = if paths.is_empty() {
        DEFAULT_IMAGES.iter().map(PathBuf::from).collect()
    } else {
        paths.to_vec()
    };
    FileDiscovery::new(Validator::new(&config.pipeline)).expand(&inputs)
}

fn print_summary(report: &BatchReport) {
    let mut summary = format!(
        "{} saved, {} failed, {} rejected",
        report.succeeded(),
        report.failed(),
        report.rejected.len()
    );
    if report.cancelled {
        summary.push_str(" (cancelled)");
    }
    println!("{}", Style::new().bold().apply_to(summary));
}

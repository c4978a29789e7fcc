//! Line-oriented run diagnostics on stdout, with an optional progress bar.

use std::path::Path;
use std::time::Duration;

use imgpipe_core::{BatchReport, ItemOutcome, PipelineObserver, Rejection};
use indicatif::{ProgressBar, ProgressStyle};

/// Prints one line per stage, item and batch.
///
/// With a progress bar attached, lines are routed through the bar so it
/// stays at the bottom of the terminal.
pub struct ConsoleObserver {
    progress: Option<ProgressBar>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Attach a progress bar sized to `total` candidate paths.
    pub fn with_progress(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            progress: Some(bar),
        }
    }

    fn line(&self, text: String) {
        match &self.progress {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }

    fn tick(&self) {
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ConsoleObserver {
    fn input_rejected(&self, rejection: &Rejection) {
        self.line(rejection.to_string());
        self.tick();
    }

    fn stage_completed(&self, stage: &str, _path: &Path, elapsed: Duration) {
        self.line(stage_line(stage, elapsed));
    }

    fn item_finished(&self, outcome: &ItemOutcome) {
        self.line(outcome_line(outcome));
        self.tick();
    }

    fn batch_finished(&self, report: &BatchReport) {
        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        println!("Total {} pipeline time: {:?}", report.mode, report.elapsed);
    }
}

/// "Resize stage took 1.2ms"
fn stage_line(stage: &str, elapsed: Duration) -> String {
    let mut chars = stage.chars();
    let title = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{} stage took {:?}", title, elapsed)
}

fn outcome_line(outcome: &ItemOutcome) -> String {
    match &outcome.failure {
        None => format!("Success! {}", outcome.destination_path.display()),
        Some(failure) => format!("Failed! {}", failure.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgpipe_core::{Failure, FailureKind};
    use std::path::PathBuf;

    #[test]
    fn stage_line_capitalizes_name() {
        assert_eq!(
            stage_line("grayscale", Duration::from_millis(3)),
            "Grayscale stage took 3ms"
        );
    }

    #[test]
    fn outcome_lines() {
        let mut outcome = ItemOutcome {
            source_path: PathBuf::from("images/a.jpg"),
            destination_path: PathBuf::from("out/a.jpg"),
            failure: None,
        };
        assert_eq!(outcome_line(&outcome), "Success! out/a.jpg");

        outcome.failure = Some(Failure {
            kind: FailureKind::Save,
            message: "disk full".to_string(),
        });
        assert_eq!(outcome_line(&outcome), "Failed! disk full");
    }
}

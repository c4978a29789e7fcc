//! Batch-level data types: execution mode, per-item outcomes and the report.
//!
//! These are the values a run hands back to the caller. Printing them is left
//! to observers and the CLI.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BatchError, FailureKind, InvalidReason, PipelineError, Result};

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One item fully at a time
    Sequential,
    /// One concurrent worker per stage, connected by hand-off channels
    Parallel,
}

impl FromStr for ExecutionMode {
    type Err = BatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(BatchError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// A per-item failure as it appears in a report.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&PipelineError> for Failure {
    fn from(error: &PipelineError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result of one admitted item after it left the last stage.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl ItemOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// A candidate path that never entered the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub path: PathBuf,
    pub reason: InvalidReason,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InvalidInput: {}: {}", self.reason, self.path.display())
    }
}

/// Everything a finished run knows about its batch.
///
/// `outcomes` holds one entry per admitted item, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub mode: ExecutionMode,
    pub outcomes: Vec<ItemOutcome>,
    pub rejected: Vec<Rejection>,
    pub elapsed: Duration,
    /// The run was cut short by cancellation or the batch timeout
    pub cancelled: bool,
}

impl BatchReport {
    /// Number of items that passed validation and reached the collector.
    pub fn admitted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    /// Admitted items whose traversal ended in a failure.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Destination paths of successfully saved items, in input order.
    pub fn saved_paths(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.destination_path.as_path())
            .collect()
    }

    /// Failure counts by kind, rejected inputs included.
    pub fn failures_by_kind(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        if !self.rejected.is_empty() {
            counts.insert(FailureKind::InvalidInput, self.rejected.len());
        }
        for failure in self.outcomes.iter().filter_map(|o| o.failure.as_ref()) {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Write the report to `path` as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, failure: Option<FailureKind>) -> ItemOutcome {
        ItemOutcome {
            source_path: PathBuf::from(format!("images/{name}")),
            destination_path: PathBuf::from(format!("out/{name}")),
            failure: failure.map(|kind| Failure {
                kind,
                message: "boom".to_string(),
            }),
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "sequential".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Sequential
        );
        assert_eq!(
            "parallel\n".parse::<ExecutionMode>().unwrap(),
            ExecutionMode::Parallel
        );
        let err = "Parallel".parse::<ExecutionMode>().unwrap_err();
        assert!(matches!(err, BatchError::InvalidMode(ref m) if m == "Parallel"));
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            mode: ExecutionMode::Parallel,
            outcomes: vec![
                outcome("a.jpg", None),
                outcome("b.jpg", Some(FailureKind::Load)),
                outcome("c.jpg", None),
            ],
            rejected: vec![Rejection {
                path: PathBuf::from("d.txt"),
                reason: InvalidReason::WrongExtension,
            }],
            elapsed: Duration::from_millis(5),
            cancelled: false,
        };

        assert_eq!(report.admitted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.saved_paths(),
            vec![Path::new("out/a.jpg"), Path::new("out/c.jpg")]
        );

        let counts = report.failures_by_kind();
        assert_eq!(counts.get(&FailureKind::InvalidInput), Some(&1));
        assert_eq!(counts.get(&FailureKind::Load), Some(&1));
        assert_eq!(counts.get(&FailureKind::Save), None);
    }

    #[test]
    fn test_report_serializes_without_empty_failure() {
        let report = BatchReport {
            mode: ExecutionMode::Sequential,
            outcomes: vec![outcome("a.jpg", None)],
            rejected: vec![],
            elapsed: Duration::from_millis(1),
            cancelled: false,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"mode\":\"sequential\""));
        assert!(!json.contains("failure"));
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection {
            path: PathBuf::from("c.jpg"),
            reason: InvalidReason::DoesNotExist,
        };
        assert_eq!(rejection.to_string(), "InvalidInput: does not exist: c.jpg");
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = BatchReport {
            mode: ExecutionMode::Parallel,
            outcomes: vec![outcome("a.jpg", Some(FailureKind::Timeout))],
            rejected: vec![],
            elapsed: Duration::from_millis(1),
            cancelled: true,
        };

        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["outcomes"][0]["failure"]["kind"], "timeout");
        assert_eq!(json["cancelled"], true);

        let err = report.write_json(&dir.path().join("missing").join("r.json"));
        assert!(matches!(err, Err(crate::error::ImgpipeError::Io(_))));
    }
}

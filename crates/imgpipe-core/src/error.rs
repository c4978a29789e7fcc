//! Error types for the imgpipe processing pipeline.
//!
//! Errors are split by scope: batch-level preconditions that stop a run before
//! any worker starts, and per-item errors that only ever end one item's
//! traversal.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgpipe operations.
#[derive(Error, Debug)]
pub enum ImgpipeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// `init` without `force` found a file in the way
    #[error("Config file already exists at: {0}\nUse --force to overwrite.")]
    AlreadyExists(PathBuf),
}

/// Errors that stop a whole batch before any item is processed.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The output root does not exist (it is never created on the caller's behalf)
    #[error("Output directory does not exist: {0}")]
    OutputDirectoryMissing(PathBuf),

    /// The execution mode is neither `sequential` nor `parallel`
    #[error("Invalid mode '{0}'. Please enter 'sequential' or 'parallel'.")]
    InvalidMode(String),
}

/// Why a candidate path was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Nothing exists at the path
    DoesNotExist,
    /// The path's extension is not in the accepted set
    WrongExtension,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::DoesNotExist => write!(f, "does not exist"),
            InvalidReason::WrongExtension => write!(f, "wrong extension"),
        }
    }
}

/// Per-item errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image could not be read or decoded
    #[error("Load error for {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Resize failed
    #[error("Resize error for {path}: {message}")]
    Resize { path: PathBuf, message: String },

    /// Image could not be encoded or written
    #[error("Save error for {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// A stage past load received an item without a decoded image
    #[error("No decoded image for {path} in {stage} stage")]
    MissingPayload { path: PathBuf, stage: String },

    /// Stage did not finish in time
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// Stage task panicked or was aborted
    #[error("{stage} stage failed for {path}: {message}")]
    Stage {
        path: PathBuf,
        stage: String,
        message: String,
    },
}

/// Coarse failure classification used for report counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before admission; counted from `BatchReport::rejected`
    InvalidInput,
    Load,
    Resize,
    Save,
    MissingPayload,
    Timeout,
    Stage,
}

impl PipelineError {
    /// Classify this error for aggregation.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Load { .. } => FailureKind::Load,
            PipelineError::Resize { .. } => FailureKind::Resize,
            PipelineError::Save { .. } => FailureKind::Save,
            PipelineError::MissingPayload { .. } => FailureKind::MissingPayload,
            PipelineError::Timeout { .. } => FailureKind::Timeout,
            PipelineError::Stage { .. } => FailureKind::Stage,
        }
    }
}

/// Convenience type alias for imgpipe results.
pub type Result<T> = std::result::Result<T, ImgpipeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

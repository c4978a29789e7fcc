//! imgpipe core - load, resize, grayscale and save a batch of images.
//!
//! A batch can run sequentially (each image through every stage before the
//! next image starts) or as a staged pipeline, where every stage is its own
//! worker and adjacent workers are joined by single-slot hand-offs:
//!
//! ```text
//! paths → validate → Load → Resize → Grayscale → Save → collector → BatchReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgpipe_core::{BatchProcessor, Config, ExecutionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let processor = BatchProcessor::new(&config);
//!
//!     let paths = vec!["images/apple.jpg".into()];
//!     let report = processor
//!         .run(ExecutionMode::Parallel, &paths, &config.output_dir())
//!         .await?;
//!     println!("{} saved", report.succeeded());
//!     report.write_json("report.json".as_ref())?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    BatchError, ConfigError, FailureKind, ImgpipeError, InvalidReason, PipelineError,
    PipelineResult, Result,
};
pub use observer::{NoopObserver, PipelineObserver, TracingObserver};
pub use pipeline::{BatchProcessor, FileDiscovery, Item, Stage, Validator};
pub use types::{BatchReport, ExecutionMode, Failure, ItemOutcome, Rejection};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

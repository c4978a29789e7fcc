//! Image processing pipeline components.
//!
//! - **item**: the unit of work and the flow value carried between stages
//! - **validate**: admission checks for candidate paths
//! - **source**: turns candidate paths into items
//! - **stage**: the load, resize, grayscale and save transformations
//! - **channel**: hand-off channels and the per-stage worker
//! - **collector**: drains the terminal hand-off
//! - **processor**: sequential and pipelined batch runners
//! - **discovery**: expands directory arguments into candidate paths

pub mod channel;
pub mod collector;
pub mod discovery;
pub mod item;
pub mod processor;
pub mod source;
pub mod stage;
pub mod validate;

// Re-exports for convenient access
pub use discovery::FileDiscovery;
pub use item::{derive_destination, Flow, Item, ItemFailure};
pub use processor::BatchProcessor;
pub use stage::{default_stages, GrayscaleStage, LoadStage, ResizeStage, SaveStage, Stage};
pub use validate::{output_directory_exists, Validator};

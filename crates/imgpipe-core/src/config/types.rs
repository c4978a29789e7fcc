//! Sub-configuration structs with their defaults.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Pipeline wiring and admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Prefix in source paths that is replaced by the output directory
    pub input_root: String,

    /// Directory that receives processed images; must already exist
    pub output_dir: String,

    /// Accepted file extensions, without the dot (case-sensitive)
    pub accepted_extensions: Vec<String>,

    /// Items held in each hand-off between stage workers
    pub buffer_size: usize,

    /// Per-item limit for a single stage in milliseconds
    pub stage_timeout_ms: u64,

    /// Optional limit for a whole batch in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: "images/".to_string(),
            output_dir: "./images/output/".to_string(),
            accepted_extensions: vec!["jpg".to_string(), "jpeg".to_string()],
            buffer_size: 1,
            stage_timeout_ms: 30000,
            batch_timeout_ms: None,
        }
    }
}

/// Resampling filter used by the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Resize stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Resampling filter
    pub filter: ResizeFilter,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            filter: ResizeFilter::default(),
        }
    }
}

/// Save stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG encoder quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 75 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

//! Processing stages: load, resize, grayscale and save.
//!
//! A stage consumes one item and produces one item or a per-item error. Stages
//! hold only their own read-only settings, so the same stage value can be
//! driven by the sequential runner or by a pipeline worker.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, OutputConfig, ResizeConfig};
use crate::error::{PipelineError, PipelineResult};

use super::item::Item;

/// One transformation step.
///
/// `apply` runs synchronously and may be called from a blocking-pool thread,
/// so implementations must be `Send + Sync` and keep no mutable state.
pub trait Stage: Send + Sync {
    /// Short lowercase name used in diagnostics ("load", "resize", ...).
    fn name(&self) -> &str;

    /// Transform one item.
    fn apply(&self, item: Item) -> PipelineResult<Item>;
}

/// The standard stage list: load, resize, grayscale, save.
pub fn default_stages(config: &Config) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(LoadStage),
        Arc::new(ResizeStage::new(&config.resize)),
        Arc::new(GrayscaleStage),
        Arc::new(SaveStage::new(&config.output)),
    ]
}

/// Reads and decodes the source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStage;

impl Stage for LoadStage {
    fn name(&self) -> &str {
        "load"
    }

    fn apply(&self, item: Item) -> PipelineResult<Item> {
        let path = item.source_path();
        let reader = image::ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| PipelineError::Load {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?;
        let image = reader.decode().map_err(|e| PipelineError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(item.with_payload(image))
    }
}

/// Scales the image to a fixed size.
#[derive(Debug, Clone)]
pub struct ResizeStage {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl ResizeStage {
    pub fn new(config: &ResizeConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            filter: config.filter.into(),
        }
    }
}

impl Stage for ResizeStage {
    fn name(&self) -> &str {
        "resize"
    }

    fn apply(&self, item: Item) -> PipelineResult<Item> {
        let resized = item
            .require_payload(self.name())?
            .resize_exact(self.width, self.height, self.filter);
        Ok(item.with_payload(resized))
    }
}

/// Converts to 8-bit luma.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleStage;

impl Stage for GrayscaleStage {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn apply(&self, item: Item) -> PipelineResult<Item> {
        // to_luma8 drops any alpha channel, which the JPEG encoder rejects
        let gray = item.require_payload(self.name())?.to_luma8();
        Ok(item.with_payload(DynamicImage::ImageLuma8(gray)))
    }
}

/// Encodes the image as JPEG and moves it to the destination path once the
/// item is committed.
#[derive(Debug, Clone)]
pub struct SaveStage {
    quality: u8,
}

impl SaveStage {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            quality: config.jpeg_quality,
        }
    }
}

impl Stage for SaveStage {
    fn name(&self) -> &str {
        "save"
    }

    fn apply(&self, item: Item) -> PipelineResult<Item> {
        let image = item.require_payload(self.name())?;
        let dest = item.destination_path();
        let save_err = |message: String| PipelineError::Save {
            path: dest.to_path_buf(),
            message,
        };

        // Encode next to the destination, then rename into place once the
        // item is committed.
        let partial = partial_path(dest);
        if let Err(e) = self.encode(image, &partial) {
            let _ = std::fs::remove_file(&partial);
            return Err(save_err(e));
        }

        if !item.publication().commit() {
            let _ = std::fs::remove_file(&partial);
            return Err(save_err("abandoned before publishing".to_string()));
        }
        std::fs::rename(&partial, dest).map_err(|e| {
            let _ = std::fs::remove_file(&partial);
            save_err(format!("Cannot move file into place: {}", e))
        })?;

        Ok(item)
    }
}

impl SaveStage {
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), String> {
        let file = File::create(path).map_err(|e| format!("Cannot create file: {}", e))?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
        image.write_with_encoder(encoder).map_err(|e| e.to_string())?;
        writer
            .flush()
            .map_err(|e| format!("Cannot write file: {}", e))
    }
}

/// `out/a.jpg` -> `out/.a.jpg.partial`
fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.partial", name))
}

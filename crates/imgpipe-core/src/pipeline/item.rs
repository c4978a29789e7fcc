//! The unit of work that moves through the stages.

use image::DynamicImage;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Failure, ItemOutcome};

/// One image on its way through the pipeline.
///
/// Items are moved between stages, never shared. The decoded image is
/// absent until the load stage fills it in, and each transforming stage
/// replaces it wholesale.
#[derive(Debug)]
pub struct Item {
    source_path: PathBuf,
    destination_path: PathBuf,
    payload: Option<DynamicImage>,
    publication: Publication,
}

impl Item {
    /// Create an item, deriving its destination from the source path.
    pub fn new(source_path: &Path, input_root: &str, output_root: &str) -> Self {
        Self {
            destination_path: derive_destination(source_path, input_root, output_root),
            source_path: source_path.to_path_buf(),
            payload: None,
            publication: Publication::default(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    pub fn payload(&self) -> Option<&DynamicImage> {
        self.payload.as_ref()
    }

    /// Shared handle deciding whether this item's output may appear on disk.
    pub fn publication(&self) -> &Publication {
        &self.publication
    }

    /// Borrow the decoded image, or fail with `MissingPayload` for `stage`.
    pub fn require_payload(&self, stage: &str) -> PipelineResult<&DynamicImage> {
        self.payload
            .as_ref()
            .ok_or_else(|| PipelineError::MissingPayload {
                path: self.source_path.clone(),
                stage: stage.to_string(),
            })
    }

    /// Replace the decoded image.
    pub fn with_payload(self, payload: DynamicImage) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    /// End this item's traversal with `error`, releasing the image.
    pub fn fail(self, error: PipelineError) -> ItemFailure {
        ItemFailure {
            source_path: self.source_path,
            destination_path: self.destination_path,
            error,
        }
    }
}

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Settles, once, whether an item's output is published or abandoned.
///
/// A stage that outlives its timeout keeps running on the blocking pool. The
/// runner abandons the item, and a writing stage must [`commit`] before it
/// makes its output visible, so an item reported as failed never shows up in
/// the output directory. Whichever side gets there first wins.
///
/// [`commit`]: Publication::commit
#[derive(Debug, Clone, Default)]
pub struct Publication(Arc<AtomicU8>);

impl Publication {
    /// Claim the right to publish. Returns false if the item was abandoned.
    pub fn commit(&self) -> bool {
        match self
            .0
            .compare_exchange(PENDING, COMMITTED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(state) => state == COMMITTED,
        }
    }

    /// Give up on the item. Returns false if its output was already committed.
    pub fn abandon(&self) -> bool {
        match self
            .0
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(state) => state == ABANDONED,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::Acquire) == ABANDONED
    }
}

/// An item whose traversal ended early. Later stages pass it through untouched.
#[derive(Debug)]
pub struct ItemFailure {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub error: PipelineError,
}

/// What travels over a hand-off: a live item or the record of a failed one.
pub type Flow = Result<Item, ItemFailure>;

impl From<Flow> for ItemOutcome {
    fn from(flow: Flow) -> Self {
        match flow {
            Ok(item) => ItemOutcome {
                source_path: item.source_path,
                destination_path: item.destination_path,
                failure: None,
            },
            Err(failure) => ItemOutcome {
                failure: Some(Failure::from(&failure.error)),
                source_path: failure.source_path,
                destination_path: failure.destination_path,
            },
        }
    }
}

/// Compute where an item is written.
///
/// Both roots are treated as directories: a missing trailing separator is
/// added before substitution. The first occurrence of `input_root` in the
/// source path is replaced by `output_root`. When the prefix does not occur,
/// the file name is placed directly under `output_root` so the source is
/// never the destination.
pub fn derive_destination(source_path: &Path, input_root: &str, output_root: &str) -> PathBuf {
    let source = source_path.to_string_lossy();
    let input_root = as_directory(input_root);
    if !input_root.is_empty() && source.contains(&*input_root) {
        let output_root = as_directory(output_root);
        return PathBuf::from(source.replacen(&*input_root, &output_root, 1));
    }
    match source_path.file_name() {
        Some(name) => Path::new(output_root).join(name),
        None => Path::new(output_root).join(source.as_ref()),
    }
}

fn as_directory(root: &str) -> Cow<'_, str> {
    if root.is_empty() || root.ends_with('/') || root.ends_with(std::path::MAIN_SEPARATOR) {
        Cow::Borrowed(root)
    } else {
        Cow::Owned(format!("{}{}", root, std::path::MAIN_SEPARATOR))
    }
}

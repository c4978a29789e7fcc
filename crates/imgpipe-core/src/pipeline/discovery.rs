//! Expands directory arguments into candidate image paths.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::validate::Validator;

/// Builds the candidate list for a batch.
pub struct FileDiscovery {
    validator: Validator,
}

impl FileDiscovery {
    /// Create a discovery instance that keeps files the validator would accept.
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Expand inputs into an ordered candidate list.
    ///
    /// File (or missing) paths are kept as given so the validator can report
    /// them. Directories are walked recursively and contribute only files
    /// with an accepted extension, sorted by path.
    pub fn expand(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for input in inputs {
            if input.is_dir() {
                candidates.extend(self.walk(input));
            } else {
                candidates.push(input.clone());
            }
        }
        candidates
    }

    fn walk(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.validator.has_accepted_extension(p))
            .collect();

        // Sort by path for deterministic ordering
        files.sort();
        files
    }
}

//! Admission checks applied to every candidate path before an item exists.

use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::InvalidReason;
use crate::types::Rejection;

/// Decides which candidate paths may enter a batch.
///
/// Both execution modes call the same validator, so admission never depends
/// on the mode.
#[derive(Debug, Clone)]
pub struct Validator {
    accepted_extensions: Vec<String>,
}

impl Validator {
    /// Create a validator from the pipeline settings.
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_extensions(config.accepted_extensions.clone())
    }

    pub fn with_extensions(accepted_extensions: Vec<String>) -> Self {
        Self {
            accepted_extensions,
        }
    }

    /// Check a candidate path.
    ///
    /// Checks, in order:
    /// - Something exists at the path
    /// - The extension is in the accepted set (case-sensitive)
    pub fn validate(&self, path: &Path) -> Result<(), Rejection> {
        if !path.exists() {
            return Err(Rejection {
                path: path.to_path_buf(),
                reason: InvalidReason::DoesNotExist,
            });
        }

        if !self.has_accepted_extension(path) {
            return Err(Rejection {
                path: path.to_path_buf(),
                reason: InvalidReason::WrongExtension,
            });
        }

        Ok(())
    }

    /// Check only the extension.
    pub fn has_accepted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.accepted_extensions.iter().any(|a| a == ext))
    }
}

/// True only if `path` names an existing directory.
pub fn output_directory_exists(path: &Path) -> bool {
    path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(&PipelineConfig::default())
    }

    fn reason(result: Result<(), Rejection>) -> Option<InvalidReason> {
        result.err().map(|r| r.reason)
    }

    #[test]
    fn test_existing_jpg_admitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"x").unwrap();
        assert!(validator().validate(&path).is_ok());
    }

    #[test]
    fn test_existing_png_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(
            reason(validator().validate(&path)),
            Some(InvalidReason::WrongExtension)
        );
    }

    #[test]
    fn test_missing_jpeg_rejected_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "c.jpeg"] {
            assert_eq!(
                reason(validator().validate(&dir.path().join(name))),
                Some(InvalidReason::DoesNotExist)
            );
        }
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        let v = validator();
        assert!(v.has_accepted_extension(Path::new("a.jpg")));
        assert!(v.has_accepted_extension(Path::new("a.jpeg")));
        assert!(!v.has_accepted_extension(Path::new("a.JPG")));
        assert!(!v.has_accepted_extension(Path::new("a.txt")));
        assert!(!v.has_accepted_extension(Path::new("jpg")));
    }

    #[test]
    fn test_output_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(output_directory_exists(dir.path()));
        assert!(!output_directory_exists(&dir.path().join("missing")));

        let file = dir.path().join("file.jpg");
        std::fs::write(&file, b"x").unwrap();
        assert!(!output_directory_exists(&file));
    }
}

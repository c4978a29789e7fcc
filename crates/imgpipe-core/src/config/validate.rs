//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.pipeline.stage_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.stage_timeout_ms must be > 0".into(),
            ));
        }
        if self.pipeline.batch_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "pipeline.batch_timeout_ms must be > 0 when set".into(),
            ));
        }
        if self.pipeline.accepted_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.accepted_extensions must not be empty".into(),
            ));
        }
        if self
            .pipeline
            .accepted_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::ValidationError(
                "pipeline.accepted_extensions entries must be non-empty and have no leading dot"
                    .into(),
            ));
        }
        if self.resize.width == 0 || self.resize.height == 0 {
            return Err(ConfigError::ValidationError(
                "resize.width and resize.height must be > 0".into(),
            ));
        }
        if self.output.jpeg_quality == 0 || self.output.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "output.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let mut config = Config::default();
        config.pipeline.buffer_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("buffer_size"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = Config::default();
        config.pipeline.stage_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stage_timeout_ms"));

        let mut config = Config::default();
        config.pipeline.batch_timeout_ms = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let mut config = Config::default();
        config.pipeline.accepted_extensions = vec![".jpg".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("accepted_extensions"));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let mut config = Config::default();
        config.resize.height = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("resize"));
    }
}

use super::{types::PandocConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - pandoc_path and output_dir are not empty
/// - timeout_secs is not 0
/// - validation.conversion_ratio_threshold is within [0, 1]
pub fn validate_config(config: &PandocConfig) -> Result<(), ConfigError> {
    if config.pandoc_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "pandoc_path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0".to_string(),
        ));
    }

    let ratio = config.validation.conversion_ratio_threshold;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ConfigError::ValidationError(format!(
            "validation.conversion_ratio_threshold must be between 0 and 1, got {}",
            ratio
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&PandocConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_timeout_zero_fails() {
        let config = PandocConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_output_dir_fails() {
        let config = PandocConfig::default().with_output_dir(PathBuf::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_ratio_out_of_range_fails() {
        let mut config = PandocConfig::default();
        config.validation.conversion_ratio_threshold = 1.5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("conversion_ratio_threshold"));
    }
}

use crate::config::types::{Config, FetcherConfig, OutputConfig, PipelineConfig};
use crate::ConfigError;
use scraper::Selector;
use std::time::Duration;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.input_file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "input_file cannot be empty".to_string(),
        ));
    }

    validate_output_config(&config.output)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_fetcher_config(&config.fetcher)?;
    Ok(())
}

/// Validates output file configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    for (name, path) in [
        ("results_file", &config.results_file),
        ("failures_file", &config.failures_file),
    ] {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates pipeline configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 100 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 100, got {}",
            config.worker_count
        )));
    }

    if config.buffer_size < 1 {
        return Err(ConfigError::Validation(format!(
            "buffer_size must be >= 1, got {}",
            config.buffer_size
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates fetcher configuration, including that the configured CSS
/// selectors actually parse
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.request_timeout < Duration::from_secs(1) {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {:?}",
            config.request_timeout
        )));
    }

    for selector in [&config.container_selector, &config.image_selector] {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: e.to_string(),
        })?;
    }

    if config.image_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "image_attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}

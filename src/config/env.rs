use crate::config::types::{Config, FetcherConfig, OutputConfig, PipelineConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use std::time::Duration;

/// Loads configuration from the environment
///
/// A `.env` file in the working directory is loaded first when present;
/// its absence is not an error since variables may be set directly. Every
/// value has a default, invalid numeric values fall back to the default
/// with a logged warning, and the result is validated before use. The
/// output directory is created if it does not exist.
///
/// # Returns
///
/// * `Ok(Config)` - Validated, ready-to-use configuration
/// * `Err(ConfigError)` - Validation failed or the output directory could
///   not be created
pub fn load_config() -> Result<Config, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let output = OutputConfig {
        output_dir: get_env("OUTPUT_DIR", "output"),
        results_file: get_env("RESULTS_FILE", "output/results.json"),
        failures_file: get_env("FAILED_URLS_FILE", "output/failed_urls.json"),
    };

    let pipeline = PipelineConfig {
        worker_count: get_env_parsed("WORKER_COUNT", 5),
        buffer_size: get_env_parsed("BUFFER_SIZE", 100),
        max_retries: get_env_parsed("MAX_RETRIES", 3),
        retry_delay: Duration::from_secs(get_env_parsed("RETRY_DELAY_SECS", 2)),
    };

    let fetcher = FetcherConfig {
        request_timeout: Duration::from_secs(get_env_parsed("REQUEST_TIMEOUT_SECS", 15)),
        container_selector: get_env("CONTAINER_SELECTOR", "#js-product-images-container"),
        image_selector: get_env("IMAGE_SELECTOR", "[data-slide-id=\"zoom\"]"),
        image_attribute: get_env("IMAGE_ATTRIBUTE", "href"),
    };

    let config = Config {
        input_file: get_env("INPUT_FILE", "products.csv"),
        output,
        pipeline,
        fetcher,
    };

    validate(&config)?;

    std::fs::create_dir_all(&config.output.output_dir).map_err(|source| {
        ConfigError::OutputDir {
            path: config.output.output_dir.clone(),
            source,
        }
    })?;

    Ok(config)
}

/// Reads a string environment variable with a fallback default
fn get_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses a numeric environment variable with a fallback default
fn get_env_parsed<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(
                    "Invalid value {:?} for {}, using default: {}",
                    value,
                    key,
                    default
                );
                default
            }
        },
        Err(_) => default,
    }
}

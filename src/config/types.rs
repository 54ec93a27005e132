use std::time::Duration;

/// Main configuration structure for Tsumugi
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the tabular input file listing work items
    pub input_file: String,

    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
    pub fetcher: FetcherConfig,
}

/// Output file configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Directory for output files, created on load if missing
    pub output_dir: String,

    /// Path to the successful-results JSON snapshot
    pub results_file: String,

    /// Path to the failed-items JSON snapshot
    pub failures_file: String,
}

/// Pipeline behavior configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent worker tasks
    pub worker_count: usize,

    /// Capacity of the work and result channels
    pub buffer_size: usize,

    /// Maximum fetch attempts per work item
    pub max_retries: u32,

    /// Delay between attempts for the same item
    pub retry_delay: Duration,
}

/// Page fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-attempt request timeout
    pub request_timeout: Duration,

    /// CSS selector that must be present for a page to count as loaded
    pub container_selector: String,

    /// CSS selector matching the elements to extract from
    pub image_selector: String,

    /// Attribute read from each matched element
    pub image_attribute: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            results_file: "output/results.json".to_string(),
            failures_file: "output/failed_urls.json".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            buffer_size: 100,
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            container_selector: "#js-product-images-container".to_string(),
            image_selector: "[data-slide-id=\"zoom\"]".to_string(),
            image_attribute: "href".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: "products.csv".to_string(),
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
            fetcher: FetcherConfig::default(),
        }
    }
}

#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

pub use settings::ScrapeSettings;

#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tirana-index")]
#[command(about = "Crawls MerrJep apartment listings into a daily neighborhood price index")]
pub struct CliConfig {
    /// Input CSV, one neighborhood name per row
    #[arg(long, default_value = "neighborhoods.csv")]
    pub neighborhoods: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "listings_data.csv")]
    pub listings_file: String,

    #[arg(long, default_value = "historical_indices.csv")]
    pub history_file: String,

    /// Optional TOML settings file (site URLs, thresholds, retry policy)
    #[arg(long)]
    pub config: Option<String>,

    /// WebDriver endpoint for the search-page renderer
    #[arg(long, default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Neighborhoods per renderer session
    #[arg(long, default_value = "2")]
    pub batch_size: usize,

    /// Detail-fetch worker pool size
    #[arg(long, default_value = "6")]
    pub workers: usize,

    /// Shared rate limit, requests per second across all workers
    #[arg(long, default_value = "8")]
    pub rate: u32,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU/memory stats between phases")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn listings_file(&self) -> &str {
        &self.listings_file
    }

    fn history_file(&self) -> &str {
        &self.history_file
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn requests_per_second(&self) -> u32 {
        self.rate
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        validate_non_empty_string("neighborhoods", &self.neighborhoods)?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("listings_file", &self.listings_file)?;
        validate_non_empty_string("history_file", &self.history_file)?;
        validate_url("webdriver_url", &self.webdriver_url)?;
        validate_positive_number("batch_size", self.batch_size, 1)?;
        validate_positive_number("workers", self.workers, 1)?;
        validate_positive_number("rate", self.rate as usize, 1)?;
        Ok(())
    }
}

pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::batch_submitter::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY};
#[cfg(feature = "cli")]
use crate::core::export::DEFAULT_EXPORT_FILENAME;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::presentation::table::DEFAULT_PAGE_SIZE;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://modeloapi-01.onrender.com/api/predictions/";
pub const MAX_CONCURRENCY: usize = 16;
pub const INPUT_EXTENSIONS: [&str; 2] = ["csv", "txt"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "churn-etl")]
#[command(about = "Send a customer CSV to a churn prediction API and report the results")]
pub struct CliConfig {
    /// CSV file with a header row and one customer per line
    pub input: String,

    #[arg(long, default_value = DEFAULT_API_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Batches in flight at once; 1 sends them strictly one after another
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Send the CSV columns as-is instead of mapping them to the API schema
    #[arg(long)]
    pub no_schema_mapping: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, default_value = DEFAULT_EXPORT_FILENAME)]
    pub export_filename: String,

    /// Also write churn_report.zip with results, charts and summary
    #[arg(long)]
    pub bundle: bool,

    /// Only show table rows containing this text
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value = "1")]
    pub page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn apply_schema_mapping(&self) -> bool {
        !self.no_schema_mapping
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn export_filename(&self) -> &str {
        &self.export_filename
    }

    fn bundle_report(&self) -> bool {
        self.bundle
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, &INPUT_EXTENSIONS)?;
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        validation::validate_range("concurrency", self.concurrency, 1, MAX_CONCURRENCY)?;
        validation::validate_non_empty_string("export_filename", &self.export_filename)?;
        validation::validate_positive_number("page_size", self.page_size, 1)?;
        Ok(())
    }
}

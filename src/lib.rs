pub mod config;
pub mod core;
pub mod domain;
pub mod presentation;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    churn_pipeline::ChurnPipeline,
    etl::{EtlEngine, EtlOutcome},
    http_client::HttpPredictionClient,
};
pub use utils::error::{EtlError, Result};

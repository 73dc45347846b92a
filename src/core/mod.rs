pub mod aggregator;
pub mod batch_submitter;
pub mod churn_pipeline;
pub mod csv_decoder;
pub mod etl;
pub mod export;
pub mod http_client;
pub mod normalizer;
pub mod schema_mapper;

pub use crate::domain::model::{EnrichedRecord, OutboundRecord, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, PredictionClient, Storage};
pub use crate::utils::error::Result;

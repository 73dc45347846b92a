use crate::domain::model::{OutboundRecord, SubmissionReport, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn concurrency(&self) -> usize;
    fn apply_schema_mapping(&self) -> bool;
    fn request_timeout(&self) -> Option<Duration>;
    fn export_filename(&self) -> &str;
    fn bundle_report(&self) -> bool;
}

/// Remote churn model. `batch` is the JSON array body, the return value the
/// parsed JSON response of a 2xx reply.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, batch: &serde_json::Value) -> Result<serde_json::Value>;
}

pub trait ProgressReporter: Send + Sync {
    fn started(&self, _total_batches: usize) {}
    fn batch_processed(&self, batch_number: usize, total_batches: usize);
    fn finished(&self, _report: &SubmissionReport) {}
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<OutboundRecord>>;
    async fn transform(&self, data: Vec<OutboundRecord>) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<String>;
}

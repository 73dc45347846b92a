use crate::core::aggregator::aggregate;
use crate::core::batch_submitter::{BatchSubmitter, LogProgress};
use crate::core::csv_decoder::decode_csv;
use crate::core::export::{export_csv, export_json};
use crate::core::http_client::HttpPredictionClient;
use crate::core::normalizer::normalize_response;
use crate::core::schema_mapper::prepare_records;
use crate::domain::model::{
    ChurnAggregates, OutboundRecord, ResultStore, SubmissionReport, TransformResult,
};
use crate::domain::ports::{ConfigProvider, Pipeline, PredictionClient, ProgressReporter, Storage};
use crate::presentation::charts::{refresh_charts, ChartRegistry, RenderedChart};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CHARTS_FILENAME: &str = "charts.json";
pub const SUMMARY_FILENAME: &str = "summary.json";
pub const BUNDLE_FILENAME: &str = "churn_report.zip";

/// Run metadata written next to the export.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub input_path: String,
    pub api_endpoint: String,
    pub schema_mapping: bool,
    pub submission: SubmissionReport,
    pub failed_batches: usize,
    pub enriched_records: usize,
    pub aggregates: ChurnAggregates,
}

/// CSV → prediction API → enriched results, charts and exports.
pub struct ChurnPipeline<S: Storage, C: ConfigProvider, P: PredictionClient = HttpPredictionClient> {
    storage: S,
    config: C,
    client: P,
    submitter: BatchSubmitter,
    progress: Box<dyn ProgressReporter>,
}

impl<S: Storage, C: ConfigProvider> ChurnPipeline<S, C, HttpPredictionClient> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = HttpPredictionClient::from_config(&config)?;
        Self::with_client(storage, config, client)
    }
}

impl<S: Storage, C: ConfigProvider, P: PredictionClient> ChurnPipeline<S, C, P> {
    pub fn with_client(storage: S, config: C, client: P) -> Result<Self> {
        let submitter = BatchSubmitter::from_config(&config)?;
        Ok(Self {
            storage,
            config,
            client,
            submitter,
            progress: Box::new(LogProgress),
        })
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    fn summary(&self, result: &TransformResult) -> RunSummary {
        RunSummary {
            generated_at: Utc::now(),
            input_path: self.config.input_path().to_string(),
            api_endpoint: self.config.api_endpoint().to_string(),
            schema_mapping: self.config.apply_schema_mapping(),
            submission: result.submission.clone(),
            failed_batches: result.submission.failed_batches(),
            enriched_records: result.store.len(),
            aggregates: result.aggregates.clone(),
        }
    }

    fn build_bundle(&self, csv: &str, result: &TransformResult, charts: &str, summary: &str) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>(self.config.export_filename(), FileOptions::default())?;
        zip.write_all(csv.as_bytes())?;

        zip.start_file::<_, ()>("results.json", FileOptions::default())?;
        zip.write_all(export_json(result.store.records())?.as_bytes())?;

        zip.start_file::<_, ()>(CHARTS_FILENAME, FileOptions::default())?;
        zip.write_all(charts.as_bytes())?;

        zip.start_file::<_, ()>(SUMMARY_FILENAME, FileOptions::default())?;
        zip.write_all(summary.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, P: PredictionClient> Pipeline for ChurnPipeline<S, C, P> {
    async fn extract(&self) -> Result<Vec<OutboundRecord>> {
        let input_path = self.config.input_path();
        tracing::info!("📥 Reading customer file: {}", input_path);

        let bytes = self.storage.read_file(input_path).await?;
        let text = String::from_utf8_lossy(&bytes);
        let raw_records = decode_csv(&text)?;

        let apply_mapping = self.config.apply_schema_mapping();
        if !apply_mapping {
            tracing::info!("🔧 Schema mapping disabled, sending CSV columns as-is");
        }
        let records = prepare_records(raw_records, apply_mapping);

        tracing::info!("📊 Extracted {} records", records.len());
        Ok(records)
    }

    async fn transform(&self, data: Vec<OutboundRecord>) -> Result<TransformResult> {
        tracing::info!(
            "🚀 Submitting {} records to {} (batch size {}, concurrency {})",
            data.len(),
            self.config.api_endpoint(),
            self.submitter.batch_size(),
            self.submitter.concurrency()
        );

        // 每次執行都從空的結果集開始
        let mut store = ResultStore::new();
        let submission = self
            .submitter
            .submit(&data, &self.client, self.progress.as_ref(), |_, response| {
                store.extend(normalize_response(&response));
            })
            .await;

        if submission.failed_batches() > 0 {
            tracing::warn!(
                "🔶 {} of {} batches failed; their records are missing from the results",
                submission.failed_batches(),
                submission.total_batches
            );
        }

        let aggregates = aggregate(store.records());
        tracing::info!(
            "✅ {} enriched records: {} churned, {} stayed",
            store.len(),
            aggregates.churned,
            aggregates.stayed
        );

        Ok(TransformResult {
            store,
            aggregates,
            submission,
        })
    }

    async fn load(&self, result: &TransformResult) -> Result<String> {
        let summary_json = serde_json::to_string_pretty(&self.summary(result))?;
        self.storage
            .write_file(SUMMARY_FILENAME, summary_json.as_bytes())
            .await?;

        if result.store.is_empty() {
            tracing::warn!("📝 No enriched records, nothing to export");
            return Err(EtlError::EmptyExport);
        }

        let mut registry = ChartRegistry::new();
        refresh_charts(&mut registry, &result.aggregates, RenderedChart::new);
        let charts_json = serde_json::to_string_pretty(&registry.specs())?;
        self.storage
            .write_file(CHARTS_FILENAME, charts_json.as_bytes())
            .await?;

        let csv = export_csv(result.store.records())?;
        self.storage
            .write_file(self.config.export_filename(), csv.as_bytes())
            .await?;

        if self.config.bundle_report() {
            let bundle = self.build_bundle(&csv, result, &charts_json, &summary_json)?;
            tracing::debug!("Writing {} ({} bytes)", BUNDLE_FILENAME, bundle.len());
            self.storage.write_file(BUNDLE_FILENAME, &bundle).await?;
        }

        let output_path = format!("{}/{}", self.config.output_path(), self.config.export_filename());
        tracing::info!("💾 Results exported to: {}", output_path);
        Ok(output_path)
    }
}

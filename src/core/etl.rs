use crate::domain::model::TransformResult;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// What a finished run leaves behind: where the export went and the results
/// it was built from.
#[derive(Debug)]
pub struct EtlOutcome {
    pub output_path: String,
    pub result: TransformResult,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        let started = Instant::now();
        tracing::info!("Starting churn ETL process...");

        // Extract
        tracing::info!("Extracting records...");
        let records = self.pipeline.extract().await?;

        // Transform
        tracing::info!("Requesting predictions...");
        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "Received {} predictions from {} batches",
            result.store.len(),
            result.submission.succeeded_batches
        );

        // Load
        tracing::info!("Exporting results...");
        let output_path = self.pipeline.load(&result).await?;

        tracing::info!("⏱️ Finished in {:.2?}", started.elapsed());
        Ok(EtlOutcome {
            output_path,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        ChurnAggregates, EnrichedRecord, OutboundRecord, RawRecord, ResultStore, SubmissionReport,
    };
    use crate::utils::error::EtlError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts phase calls; `load` fails when `fail_load` is set.
    struct StubPipeline {
        calls: AtomicUsize,
        fail_load: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<OutboundRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut raw = RawRecord::new();
            raw.insert("CustomerID", Some("7".to_string()));
            Ok(vec![OutboundRecord::Raw(raw)])
        }

        async fn transform(&self, data: Vec<OutboundRecord>) -> Result<TransformResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut store = ResultStore::new();
            let mut fields = serde_json::Map::new();
            fields.insert("CustomerID".to_string(), json!("7"));
            fields.insert("Churn".to_string(), json!(1));
            store.extend(vec![EnrichedRecord::from_fields(fields)]);
            Ok(TransformResult {
                store,
                aggregates: ChurnAggregates::default(),
                submission: SubmissionReport {
                    total_batches: 1,
                    succeeded_batches: 1,
                    submitted_records: data.len(),
                    failures: Vec::new(),
                },
            })
        }

        async fn load(&self, _result: &TransformResult) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                return Err(EtlError::EmptyExport);
            }
            Ok("out/results.csv".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_executes_all_phases() {
        let engine = EtlEngine::new(StubPipeline {
            calls: AtomicUsize::new(0),
            fail_load: false,
        });

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome.output_path, "out/results.csv");
        assert_eq!(outcome.result.store.len(), 1);
        assert_eq!(outcome.result.submission.submitted_records, 1);
        assert_eq!(engine.pipeline.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_propagates_load_error() {
        let engine = EtlEngine::new(StubPipeline {
            calls: AtomicUsize::new(0),
            fail_load: true,
        });

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EtlError::EmptyExport));
    }
}

use crate::domain::model::{BatchFailure, SubmissionReport};
use crate::domain::ports::{ConfigProvider, PredictionClient, ProgressReporter};
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_BATCH_SIZE: usize = 1500;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// A contiguous slice of the input, tagged with its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a, T> {
    pub index: usize,
    pub items: &'a [T],
}

impl<T> Batch<'_, T> {
    /// 1-based number used in progress messages.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Splits `items` into `ceil(len / batch_size)` batches in input order.
/// A `batch_size` of 0 is treated as 1.
pub fn partition<T>(items: &[T], batch_size: usize) -> Vec<Batch<'_, T>> {
    items
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, items)| Batch { index, items })
        .collect()
}

pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Logs `batch i of total` as each batch resolves.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn started(&self, total_batches: usize) {
        tracing::info!("⏳ Processing, sending {} batches...", total_batches);
    }

    fn batch_processed(&self, batch_number: usize, total_batches: usize) {
        tracing::info!("📦 Batch {} of {} processed", batch_number, total_batches);
    }

    fn finished(&self, report: &SubmissionReport) {
        tracing::info!(
            "✅ Submission finished: {}/{} batches succeeded",
            report.succeeded_batches,
            report.total_batches
        );
    }
}

pub struct BatchSubmitter {
    batch_size: usize,
    concurrency: usize,
}

impl BatchSubmitter {
    pub fn new(batch_size: usize, concurrency: usize) -> Result<Self> {
        validate_positive_number("batch_size", batch_size, 1)?;
        validate_positive_number("concurrency", concurrency, 1)?;
        Ok(Self {
            batch_size,
            concurrency,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.batch_size(), config.concurrency())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Sends every batch and hands each successful response to `on_response`
    /// together with its batch index.
    ///
    /// At most `concurrency` requests are in flight; with the default of 1 a
    /// batch is fully resolved before the next one is sent. Responses are
    /// delivered in batch order either way. A failed batch is logged and
    /// skipped, never retried, and never stops the remaining batches.
    pub async fn submit<T, C, F>(
        &self,
        items: &[T],
        client: &C,
        progress: &dyn ProgressReporter,
        mut on_response: F,
    ) -> SubmissionReport
    where
        T: Serialize + Sync,
        C: PredictionClient + ?Sized,
        F: FnMut(usize, Value),
    {
        let batches = partition(items, self.batch_size);
        let total_batches = batches.len();
        let mut report = SubmissionReport {
            total_batches,
            submitted_records: items.len(),
            ..SubmissionReport::default()
        };

        progress.started(total_batches);

        let requests: Vec<_> = batches
            .into_iter()
            .map(|batch| async move {
                let outcome = send_batch(client, batch.items).await;
                (batch, outcome)
            })
            .collect();
        let mut outcomes = stream::iter(requests).buffered(self.concurrency);

        while let Some((batch, outcome)) = outcomes.next().await {
            match outcome {
                Ok(response) => {
                    on_response(batch.index, response);
                    report.succeeded_batches += 1;
                    progress.batch_processed(batch.number(), total_batches);
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to send batch {} of {}: {}",
                        batch.number(),
                        total_batches,
                        e
                    );
                    report.failures.push(BatchFailure {
                        batch_number: batch.number(),
                        records: batch.items.len(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        progress.finished(&report);
        report
    }
}

async fn send_batch<T, C>(client: &C, items: &[T]) -> Result<Value>
where
    T: Serialize,
    C: PredictionClient + ?Sized,
{
    let body = serde_json::to_value(items)?;
    client.predict(&body).await
}

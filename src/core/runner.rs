use crate::core::client::ChatCompletionClient;
use crate::core::dispatcher::BatchDispatcher;
use crate::domain::model::{RunConfiguration, RunSummary};
use crate::domain::ports::TextTransformer;
use crate::utils::error::{Result, RewriteError};
use crate::utils::progress::RunProgress;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drives the dispatcher over a column, one batch at a time.
///
/// Batches never overlap: the next one starts only after every call of the
/// previous one resolved and the pacing delay elapsed.
pub struct PipelineRunner<T: TextTransformer + ?Sized> {
    dispatcher: BatchDispatcher<T>,
    batch_size: usize,
    pacing_delay: Duration,
    progress: Arc<RunProgress>,
}

impl PipelineRunner<ChatCompletionClient> {
    pub fn from_config(config: &RunConfiguration) -> Result<Self> {
        Ok(Self::new(Arc::new(ChatCompletionClient::new(config)?), config))
    }
}

impl<T: TextTransformer + ?Sized> PipelineRunner<T> {
    pub fn new(transformer: Arc<T>, config: &RunConfiguration) -> Self {
        Self {
            dispatcher: BatchDispatcher::new(transformer, config.max_concurrent),
            batch_size: config.batch_size.max(1),
            pacing_delay: config.pacing_delay,
            progress: Arc::new(RunProgress::new()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<RunProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    pub async fn run(&self, values: &[String]) -> Result<Vec<String>> {
        let total = values.len();
        let batch_count = total.div_ceil(self.batch_size);
        let started = Instant::now();
        self.progress.start(total);

        tracing::info!(
            "🚀 Rewriting {} rows in {} batches of up to {} (max {} concurrent requests)",
            total,
            batch_count,
            self.batch_size,
            self.dispatcher.max_concurrent()
        );

        let mut results = Vec::with_capacity(total);
        for (index, batch) in values.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.pacing_delay.is_zero() {
                tokio::time::sleep(self.pacing_delay).await;
            }

            let batch_results = self.dispatcher.dispatch_batch(batch).await;
            if batch_results.len() != batch.len() {
                return Err(RewriteError::DataShapeError {
                    expected: batch.len(),
                    actual: batch_results.len(),
                });
            }

            results.extend(batch_results);
            self.progress.advance(batch.len());
            tracing::debug!(
                "Batch {}/{} done, {}/{} rows",
                index + 1,
                batch_count,
                results.len(),
                total
            );
        }

        if results.len() != total {
            return Err(RewriteError::DataShapeError {
                expected: total,
                actual: results.len(),
            });
        }

        let summary = RunSummary {
            rows: total,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "✅ Processed {} rows in {:.2}s ({:.2} rows/s)",
            summary.rows,
            summary.elapsed.as_secs_f64(),
            summary.rows_per_second()
        );
        self.progress.finish(summary);

        Ok(results)
    }
}

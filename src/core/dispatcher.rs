use crate::domain::model::is_blank;
use crate::domain::ports::TextTransformer;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs every call of a batch concurrently, gated by a semaphore that lives
/// as long as the dispatcher and is therefore shared by all batches of a run.
pub struct BatchDispatcher<T: TextTransformer + ?Sized> {
    transformer: Arc<T>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl<T: TextTransformer + ?Sized> BatchDispatcher<T> {
    pub fn new(transformer: Arc<T>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            transformer,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Results come back in input order: `join_all` yields each future's
    /// output at the position it was launched from, whatever order they
    /// finish in.
    pub async fn dispatch_batch(&self, batch: &[String]) -> Vec<String> {
        join_all(batch.iter().map(|text| self.dispatch_one(text))).await
    }

    async fn dispatch_one(&self, text: &str) -> String {
        if is_blank(text) {
            return text.to_string();
        }

        // permit is held for the whole call and dropped on every exit path
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!("⚠️ Concurrency gate closed; keeping original text");
                return text.to_string();
            }
        };

        self.transformer.transform(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Uppercases after a delay, tracking how many calls overlap.
    #[derive(Default)]
    struct SlowUpper {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextTransformer for SlowUpper {
        async fn transform(&self, text: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            // later items finish first
            let delay = 40u64.saturating_sub(text.len() as u64 * 3);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            text.to_uppercase()
        }
    }

    fn batch(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let transformer = Arc::new(SlowUpper::default());
        let dispatcher = BatchDispatcher::new(transformer.clone(), 8);

        let input = batch(&["a", "bb", "ccc", "dddd", "eeeee"]);
        let output = dispatcher.dispatch_batch(&input).await;

        assert_eq!(output, batch(&["A", "BB", "CCC", "DDDD", "EEEEE"]));
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_ceiling_caps_calls_within_a_batch() {
        let transformer = Arc::new(SlowUpper::default());
        let dispatcher = BatchDispatcher::new(transformer.clone(), 2);

        let input: Vec<String> = (0..9).map(|i| format!("row {}", i)).collect();
        let output = dispatcher.dispatch_batch(&input).await;

        assert_eq!(output.len(), 9);
        assert_eq!(transformer.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_values_skip_the_transformer() {
        let transformer = Arc::new(SlowUpper::default());
        let dispatcher = BatchDispatcher::new(transformer.clone(), 4);

        let input = batch(&["", "x", "   ", "\t"]);
        let output = dispatcher.dispatch_batch(&input).await;

        assert_eq!(output, batch(&["", "X", "   ", "\t"]));
        assert_eq!(transformer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ceiling_is_raised_to_one() {
        let transformer = Arc::new(SlowUpper::default());
        let dispatcher = BatchDispatcher::new(transformer.clone(), 0);

        assert_eq!(dispatcher.max_concurrent(), 1);
        let output = dispatcher.dispatch_batch(&batch(&["a", "b"])).await;
        assert_eq!(output, batch(&["A", "B"]));
        assert_eq!(transformer.peak.load(Ordering::SeqCst), 1);
    }
}

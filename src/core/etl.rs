use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting column rewrite...");
        self.monitor.log_stats("Start");

        let table = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        let result = self.pipeline.transform(table).await?;
        tracing::info!(
            "Rewrote {} rows in {:.2}s ({:.2} rows/s)",
            result.summary.rows,
            result.summary.elapsed.as_secs_f64(),
            result.summary.rows_per_second()
        );
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

use crate::core::client::ChatCompletionClient;
use crate::core::runner::PipelineRunner;
use crate::core::table_io::TableFormat;
use crate::core::{ConfigProvider, Pipeline, RunSummary, Storage, Table, TextTransformer, TransformResult};
use crate::domain::model::DryRunReport;
use crate::utils::error::{Result, RewriteError};
use crate::utils::progress::RunProgress;
use std::sync::Arc;
use std::time::Duration;

/// Reads an `.xlsx` or `.csv` table, rewrites one column through the remote API and saves
/// the table with the results in another column.
pub struct ColumnRewritePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    transformer: Arc<dyn TextTransformer>,
    progress: Arc<RunProgress>,
}

impl<S: Storage, C: ConfigProvider> ColumnRewritePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = ChatCompletionClient::new(&config.run_configuration())?;
        Ok(Self::with_transformer(storage, config, Arc::new(client)))
    }

    pub fn with_transformer(storage: S, config: C, transformer: Arc<dyn TextTransformer>) -> Self {
        let progress = Arc::new(Self::progress_for(&config));
        Self {
            storage,
            config,
            transformer,
            progress,
        }
    }

    #[cfg(feature = "cli")]
    fn progress_for(config: &C) -> RunProgress {
        if config.show_progress() {
            RunProgress::with_progress_bar()
        } else {
            RunProgress::new()
        }
    }

    #[cfg(not(feature = "cli"))]
    fn progress_for(_config: &C) -> RunProgress {
        RunProgress::new()
    }

    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    fn min_width(&self) -> usize {
        self.config.source_column().max(self.config.target_column()) + 1
    }

    /// Loads the input and counts the requests a run would make.
    pub async fn dry_run(&self) -> Result<DryRunReport> {
        let table = self.extract().await?;
        Ok(DryRunReport::from_table(&table, self.config.source_column()))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ColumnRewritePipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        let path = self.config.input_path();
        let format = TableFormat::from_path(path).ok_or_else(|| RewriteError::InputFileError {
            path: path.to_string(),
            reason: "input must be a .xlsx or .csv file".to_string(),
        })?;

        tracing::debug!("Reading {:?} input table from: {}", format, path);
        let data = self.storage.read_file(path).await.map_err(|e| match e {
            RewriteError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                RewriteError::InputFileError {
                    path: path.to_string(),
                    reason: "file does not exist".to_string(),
                }
            }
            other => other,
        })?;

        let mut table = format.read(&data, self.config.has_headers(), self.config.sheet_name())?;
        table.pad_to(self.min_width());

        tracing::info!("📥 Loaded {} rows from {}", table.rows.len(), path);
        Ok(table)
    }

    async fn transform(&self, mut table: Table) -> Result<TransformResult> {
        table.pad_to(self.min_width());
        let sources = table.column(self.config.source_column());

        let runner = PipelineRunner::new(Arc::clone(&self.transformer), &self.config.run_configuration())
            .with_progress(self.progress());
        let rewritten = runner.run(&sources).await?;

        table.set_column(self.config.target_column(), rewritten);

        let summary = self.progress.summary().unwrap_or(RunSummary {
            rows: sources.len(),
            elapsed: Duration::ZERO,
        });

        Ok(TransformResult { table, summary })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.config.output_path().to_string();
        let format = TableFormat::from_path(&output_path).ok_or_else(|| RewriteError::InvalidConfigValueError {
            field: "output".to_string(),
            value: output_path.clone(),
            reason: "output must be a .xlsx or .csv file".to_string(),
        })?;
        let data = format.write(&result.table, self.config.sheet_name())?;

        tracing::debug!("Writing {} bytes to {}", data.len(), output_path);
        self.storage.write_file(&output_path, &data).await?;

        tracing::info!("💾 Saved {} rows to {}", result.table.rows.len(), output_path);
        Ok(output_path)
    }
}

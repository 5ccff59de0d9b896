use crate::domain::model::{RunConfiguration, Table, TransformResult, DEFAULT_SHEET_NAME};
use crate::utils::error::Result;
use async_trait::async_trait;

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
    fn output_path(&self) -> &str;
    fn source_column(&self) -> usize;
    fn target_column(&self) -> usize;
    fn has_headers(&self) -> bool;
    fn show_progress(&self) -> bool;
    fn run_configuration(&self) -> RunConfiguration;

    /// Worksheet used when the input or output is a workbook.
    fn sheet_name(&self) -> &str {
        DEFAULT_SHEET_NAME
    }
}

/// Turns one cell value into its rewritten form.
///
/// Implementations must not fail: on any error they hand back the input.
#[async_trait]
pub trait TextTransformer: Send + Sync {
    async fn transform(&self, text: &str) -> String;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}

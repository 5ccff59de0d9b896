pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, TomlConfig};

pub use crate::core::{
    client::{ChatCompletionClient, TransformFailure},
    dispatcher::BatchDispatcher,
    etl::EtlEngine,
    pipeline::ColumnRewritePipeline,
    runner::PipelineRunner,
    table_io::TableFormat,
};
pub use domain::model::{DryRunReport, RunConfiguration, RunSummary, Table};
pub use domain::ports::TextTransformer;
pub use utils::error::{Result, RewriteError};
pub use utils::progress::RunProgress;

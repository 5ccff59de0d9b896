pub mod client;
pub mod dispatcher;
pub mod etl;
pub mod pipeline;
pub mod runner;
pub mod table_io;

pub use crate::domain::model::{RunConfiguration, RunSummary, Table, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TextTransformer};
pub use crate::utils::error::Result;

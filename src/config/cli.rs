use crate::core::table_io::TableFormat;
use crate::core::ConfigProvider;
use crate::domain::model::{
    RunConfiguration, DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_MAX_CONCURRENT,
    DEFAULT_MODEL, DEFAULT_SHEET_NAME, DEFAULT_TEMPERATURE,
};
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use clap::Parser;
use std::time::Duration;

#[derive(Clone, Parser)]
#[command(name = "column-rewrite")]
#[command(about = "Rewrite one column of an Excel or CSV file through a chat completion API")]
pub struct CliConfig {
    /// .xlsx or .csv file to read
    #[arg(short, long)]
    pub input: String,

    /// .xlsx or .csv file to write
    #[arg(short, long, default_value = "output.xlsx")]
    pub output: String,

    /// Worksheet to read and write for .xlsx files
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    pub sheet: String,

    /// 0-based index of the column to rewrite
    #[arg(long, default_value_t = 6)]
    pub source_column: usize,

    /// 0-based index of the column receiving the result
    #[arg(long, default_value_t = 12)]
    pub target_column: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Upper bound on simultaneous API requests
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Per-request timeout
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Pause between batches
    #[arg(long, default_value_t = 500)]
    pub pacing_ms: u64,

    /// Treat the first row as a header and leave it untouched
    #[arg(long)]
    pub has_headers: bool,

    #[arg(long, help = "Hide the progress bar")]
    pub no_progress: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("sheet", &self.sheet)
            .field("source_column", &self.source_column)
            .field("target_column", &self.target_column)
            .field("has_headers", &self.has_headers)
            .field("run", &self.run_configuration())
            .finish()
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn source_column(&self) -> usize {
        self.source_column
    }

    fn target_column(&self) -> usize {
        self.target_column
    }

    fn has_headers(&self) -> bool {
        self.has_headers
    }

    fn show_progress(&self) -> bool {
        !self.no_progress
    }

    fn sheet_name(&self) -> &str {
        &self.sheet
    }

    fn run_configuration(&self) -> RunConfiguration {
        let mut config = RunConfiguration::new(self.api_key.clone());
        config.batch_size = self.batch_size;
        config.max_concurrent = self.max_concurrent;
        config.endpoint = self.endpoint.clone();
        config.model = self.model.clone();
        config.temperature = self.temperature;
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.pacing_delay = Duration::from_millis(self.pacing_ms);
        config
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &TableFormat::EXTENSIONS)?;
        validate_path("output", &self.output)?;
        validate_file_extension("output", &self.output, &TableFormat::EXTENSIONS)?;
        self.run_configuration().validate()
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("API client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Workbook read error: {0}")]
    SpreadsheetError(#[from] calamine::XlsxError),

    #[error("Workbook write error: {0}")]
    SerializationError(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input file {path}: {reason}")]
    InputFileError { path: String, reason: String },

    #[error("Result count mismatch: expected {expected} values, got {actual}")]
    DataShapeError { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Network,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a run that failed with this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RewriteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RewriteError::ConfigError { .. }
            | RewriteError::MissingConfigError { .. }
            | RewriteError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RewriteError::InputFileError { .. }
            | RewriteError::CsvError(_)
            | RewriteError::SpreadsheetError(_) => ErrorCategory::Input,
            RewriteError::IoError(_) | RewriteError::SerializationError(_) => ErrorCategory::Output,
            RewriteError::ApiError(_) => ErrorCategory::Network,
            RewriteError::DataShapeError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Output => {
                ErrorSeverity::High
            }
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RewriteError::MissingConfigError { .. } => {
                "Provide the missing value on the command line, in the TOML file or via the environment"
            }
            RewriteError::ConfigError { .. } | RewriteError::InvalidConfigValueError { .. } => {
                "Check the configuration values and run again"
            }
            RewriteError::InputFileError { .. } => {
                "Make sure the input file exists and is a .xlsx or .csv file"
            }
            RewriteError::CsvError(_) => "Make sure the input file is valid CSV",
            RewriteError::SpreadsheetError(_) => {
                "Make sure the input is a valid .xlsx workbook and the sheet name is right"
            }
            RewriteError::SerializationError(_) => {
                "Keep the table within Excel's row and column limits, or write .csv instead"
            }
            RewriteError::IoError(_) => {
                "Check that the output directory is writable and has free space"
            }
            RewriteError::ApiError(_) => "Check the TLS setup and the API endpoint",
            RewriteError::DataShapeError { .. } => {
                "This is a bug; re-run with --verbose and report the log"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RewriteError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            RewriteError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            RewriteError::InputFileError { path, reason } => {
                format!("Cannot use input file '{}': {}", path, reason)
            }
            RewriteError::CsvError(e) => format!("Cannot read table: {}", e),
            RewriteError::SpreadsheetError(e) => format!("Cannot read workbook: {}", e),
            RewriteError::SerializationError(e) => format!("Cannot write workbook: {}", e),
            RewriteError::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RewriteError>;

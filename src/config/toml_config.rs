use crate::core::table_io::TableFormat;
use crate::core::ConfigProvider;
use crate::domain::model::{
    RunConfiguration, DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_MAX_CONCURRENT,
    DEFAULT_MODEL, DEFAULT_PACING_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHEET_NAME,
    DEFAULT_TEMPERATURE,
};
use crate::utils::error::{Result, RewriteError};
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub api: ApiConfig,
    pub concurrency: Option<ConcurrencyConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub source_column: usize,
    pub has_headers: Option<bool>,
    /// Worksheet for .xlsx input and output, `Sheet1` when omitted
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub target_column: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub batch_size: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub pacing_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub progress: Option<bool>,
    /// `compact` (default) or `json`
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RewriteError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DEEPSEEK_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RewriteError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }

    fn concurrency(&self) -> ConcurrencyConfig {
        self.concurrency.clone().unwrap_or_default()
    }
}

impl std::fmt::Debug for TomlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlConfig")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("run", &self.run_configuration())
            .field("monitoring", &self.monitoring)
            .finish()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn source_column(&self) -> usize {
        self.input.source_column
    }

    fn target_column(&self) -> usize {
        self.output.target_column
    }

    fn has_headers(&self) -> bool {
        self.input.has_headers.unwrap_or(false)
    }

    fn show_progress(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.progress)
            .unwrap_or(true)
    }

    fn sheet_name(&self) -> &str {
        self.input.sheet.as_deref().unwrap_or(DEFAULT_SHEET_NAME)
    }

    fn run_configuration(&self) -> RunConfiguration {
        let concurrency = self.concurrency();
        let mut config = RunConfiguration::new(self.api.api_key.clone());

        config.batch_size = concurrency.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        config.max_concurrent = concurrency.max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT);
        config.pacing_delay = concurrency
            .pacing_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PACING_DELAY);

        config.endpoint = self.api.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        config.model = self.api.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        config.temperature = self.api.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        config.request_timeout = self
            .api
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if let Some(template) = &self.api.prompt_template {
            config.prompt_template = template.clone();
        }

        config
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input.path", &self.input.path)?;
        validate_file_extension("input.path", &self.input.path, &TableFormat::EXTENSIONS)?;
        validate_path("output.path", &self.output.path)?;
        validate_file_extension("output.path", &self.output.path, &TableFormat::EXTENSIONS)?;

        if self.api.api_key.contains("${") {
            return Err(RewriteError::MissingConfigError {
                field: format!("api.api_key ({} is not set)", self.api.api_key),
            });
        }

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(RewriteError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        self.run_configuration().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[input]
path = "data.csv"
source_column = 6

[output]
path = "out.csv"
target_column = 12

[api]
api_key = "sk-test"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();
        let run = config.run_configuration();

        assert_eq!(config.source_column(), 6);
        assert_eq!(config.target_column(), 12);
        assert!(!config.has_headers());
        assert!(config.show_progress());
        assert!(!config.monitoring_enabled());
        assert_eq!(run.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(run.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(run.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(run.pacing_delay, DEFAULT_PACING_DELAY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[input]
path = "in.csv"
source_column = 0
has_headers = true

[output]
path = "out/result.csv"
target_column = 1

[api]
api_key = "sk-test"
endpoint = "http://localhost:8080/v1/chat/completions"
model = "custom-model"
temperature = 0.2
timeout_seconds = 5
prompt_template = "Simplify: {text}"

[concurrency]
batch_size = 4
max_concurrent = 2
pacing_ms = 0

[monitoring]
enabled = true
progress = false
log_format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let run = config.run_configuration();

        assert!(config.has_headers());
        assert!(!config.show_progress());
        assert!(config.monitoring_enabled());
        assert!(config.json_logs());
        assert_eq!(run.batch_size, 4);
        assert_eq!(run.max_concurrent, 2);
        assert_eq!(run.pacing_delay, Duration::ZERO);
        assert_eq!(run.request_timeout, Duration::from_secs(5));
        assert_eq!(run.model, "custom-model");
        assert_eq!(run.render_prompt("x"), "Simplify: x");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_workbook_paths_and_sheet() {
        let toml_content = MINIMAL
            .replace("data.csv", "input.xlsx")
            .replace("out.csv", "output.xlsx")
            .replace("source_column = 6", "source_column = 6\nsheet = \"Data\"");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();

        assert_eq!(config.sheet_name(), "Data");
        assert!(config.validate().is_ok());
        assert_eq!(TomlConfig::from_toml_str(MINIMAL).unwrap().sheet_name(), "Sheet1");

        let unsupported = MINIMAL.replace("out.csv", "out.xls");
        assert!(TomlConfig::from_toml_str(&unsupported).unwrap().validate().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COLUMN_REWRITE_TEST_KEY", "sk-from-env");

        let toml_content = MINIMAL.replace("sk-test", "${COLUMN_REWRITE_TEST_KEY}");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.api.api_key, "sk-from-env");

        std::env::remove_var("COLUMN_REWRITE_TEST_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = MINIMAL.replace("sk-test", "${COLUMN_REWRITE_UNSET_KEY}");
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(RewriteError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_endpoint_fails_validation() {
        let toml_content = MINIMAL.replace(
            "api_key = \"sk-test\"",
            "api_key = \"sk-test\"\nendpoint = \"not-a-url\"",
        );
        let config = TomlConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "data.csv");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            TomlConfig::from_toml_str("[input"),
            Err(RewriteError::ConfigError { .. })
        ));
    }
}

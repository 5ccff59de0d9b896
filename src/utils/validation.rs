use crate::domain::model::{RunConfiguration, TEXT_PLACEHOLDER};
use crate::utils::error::{Result, RewriteError};
use url::Url;

pub const MAX_CONCURRENT_LIMIT: usize = 100;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RewriteError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, path: &str, allowed_extensions: &[&str]) -> Result<()> {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if allowed_extensions.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// A secret that must be present; the value itself never ends up in the error.
pub fn validate_required_secret(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RewriteError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_prompt_template(field_name: &str, template: &str) -> Result<()> {
    if !template.contains(TEXT_PLACEHOLDER) {
        return Err(RewriteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.chars().take(40).collect(),
            reason: format!("Template must contain the {} placeholder", TEXT_PLACEHOLDER),
        });
    }
    Ok(())
}

impl Validate for RunConfiguration {
    fn validate(&self) -> Result<()> {
        validate_required_secret("api_key", &self.api_key)?;
        validate_url("endpoint", &self.endpoint)?;
        validate_positive_number("batch_size", self.batch_size, 1)?;
        validate_range("max_concurrent", self.max_concurrent, 1, MAX_CONCURRENT_LIMIT)?;
        validate_range("temperature", self.temperature, 0.0, 2.0)?;
        validate_prompt_template("prompt_template", &self.prompt_template)?;

        if self.request_timeout.is_zero() {
            return Err(RewriteError::InvalidConfigValueError {
                field: "request_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint", "https://example.com").is_ok());
        assert!(validate_url("endpoint", "http://example.com").is_ok());
        assert!(validate_url("endpoint", "").is_err());
        assert!(validate_url("endpoint", "invalid-url").is_err());
        assert!(validate_url("endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("input", "data.csv", &["csv"]).is_ok());
        assert!(validate_file_extension("input", "DATA.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("input", "data.xlsx", &["csv"]).is_err());
        assert!(validate_file_extension("input", "data", &["csv"]).is_err());
    }

    #[test]
    fn test_missing_api_key() {
        let config = RunConfiguration::new("   ");
        match config.validate() {
            Err(RewriteError::MissingConfigError { field }) => assert_eq!(field, "api_key"),
            other => panic!("expected missing api_key, got {:?}", other),
        }
    }

    #[test]
    fn test_run_configuration_bounds() {
        assert!(RunConfiguration::new("key").validate().is_ok());

        let mut config = RunConfiguration::new("key");
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfiguration::new("key");
        config.max_concurrent = MAX_CONCURRENT_LIMIT + 1;
        assert!(config.validate().is_err());

        let mut config = RunConfiguration::new("key");
        config.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = RunConfiguration::new("key");
        config.prompt_template = "no placeholder".to_string();
        assert!(config.validate().is_err());
    }
}

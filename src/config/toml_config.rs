use crate::core::aggregate::DEFAULT_AGG_INTERVAL;
use crate::core::{ConfigProvider, SinkFormat};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
    pub aggregation: Option<AggregationConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cached response JSON files.
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the flushed batches are written to.
    pub dir: String,
    pub format: Option<SinkFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub interval: Option<usize>,
    pub debug_mode: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` with the environment variable's value.
    /// Unset variables stay as written so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        crate::utils::validation::validate_path("cache.dir", &self.cache.dir)?;
        crate::utils::validation::validate_path("output.dir", &self.output.dir)?;

        if let Some(interval) = self.aggregation.as_ref().and_then(|a| a.interval) {
            crate::utils::validation::validate_positive_number(
                "aggregation.interval",
                interval,
                1,
            )?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// Whether logs should go out as JSON lines instead of compact text.
    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn cache_dir(&self) -> &str {
        &self.cache.dir
    }

    fn save_dir(&self) -> &str {
        &self.output.dir
    }

    fn agg_interval(&self) -> usize {
        self.aggregation
            .as_ref()
            .and_then(|a| a.interval)
            .unwrap_or(DEFAULT_AGG_INTERVAL)
    }

    fn sink_format(&self) -> SinkFormat {
        self.output.format.unwrap_or_default()
    }

    fn debug_mode(&self) -> bool {
        self.aggregation
            .as_ref()
            .and_then(|a| a.debug_mode)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[pipeline]
name = "tweetgraph"
description = "Search response aggregation"

[cache]
dir = "./cache"

[output]
dir = "./output"
format = "csv"

[aggregation]
interval = 500
debug_mode = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "tweetgraph");
        assert_eq!(config.cache_dir(), "./cache");
        assert_eq!(config.save_dir(), "./output");
        assert_eq!(config.sink_format(), SinkFormat::Csv);
        assert_eq!(config.agg_interval(), 500);
        assert!(config.debug_mode());
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_defaults_without_optional_sections() {
        let toml_content = r#"
[pipeline]
name = "tweetgraph"

[cache]
dir = "./cache"

[output]
dir = "./output"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.agg_interval(), DEFAULT_AGG_INTERVAL);
        assert_eq!(config.sink_format(), SinkFormat::Json);
        assert!(!config.debug_mode());
        assert!(!config.log_json());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_TWEET_CACHE", "/data/tweet-cache");

        let toml_content = r#"
[pipeline]
name = "tweetgraph"

[cache]
dir = "${TEST_TWEET_CACHE}"

[output]
dir = "./output"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.cache_dir(), "/data/tweet-cache");

        std::env::remove_var("TEST_TWEET_CACHE");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[pipeline]
name = "  "

[cache]
dir = "./cache"

[output]
dir = "./output"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let toml_content = r#"
[pipeline]
name = "tweetgraph"

[cache]
dir = "./cache"

[output]
dir = "./output"

[aggregation]
interval = 0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[pipeline]
name = "file-test"

[cache]
dir = "./cache"

[output]
dir = "./output"

[monitoring]
enabled = true
log_json = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
        assert!(config.monitoring_enabled());
        assert!(config.log_json());
    }
}

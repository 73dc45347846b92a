use crate::config::{DEFAULT_API_ENDPOINT, INPUT_EXTENSIONS, MAX_CONCURRENCY};
use crate::core::batch_submitter::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY};
use crate::core::export::DEFAULT_EXPORT_FILENAME;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_true")]
    pub apply_schema_mapping: bool,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            apply_schema_mapping: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_export_filename")]
    pub export_filename: String,
    #[serde(default)]
    pub bundle: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            export_filename: default_export_filename(),
            bundle: false,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_true() -> bool {
    true
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_export_filename() -> String {
    DEFAULT_EXPORT_FILENAME.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_ENDPOINT})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &INPUT_EXTENSIONS)?;
        validation::validate_positive_number("submit.batch_size", self.submit.batch_size, 1)?;
        validation::validate_range("submit.concurrency", self.submit.concurrency, 1, MAX_CONCURRENCY)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_non_empty_string("load.export_filename", &self.load.export_filename)?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn batch_size(&self) -> usize {
        self.submit.batch_size
    }

    fn concurrency(&self) -> usize {
        self.submit.concurrency
    }

    fn apply_schema_mapping(&self) -> bool {
        self.submit.apply_schema_mapping
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn export_filename(&self) -> &str {
        &self.load.export_filename
    }

    fn bundle_report(&self) -> bool {
        self.load.bundle
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
    fn test_parse_full_config() {
        let toml_content = r#"
[pipeline]
name = "monthly-churn"
description = "Monthly churn scoring"
version = "1.0.0"

[source]
endpoint = "https://api.example.com/api/predictions/"
timeout_seconds = 45

[input]
path = "customers.csv"

[submit]
batch_size = 500
concurrency = 2
apply_schema_mapping = false

[load]
output_path = "./reports"
export_filename = "scored.csv"
bundle = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "monthly-churn");
        assert_eq!(config.api_endpoint(), "https://api.example.com/api/predictions/");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(config.batch_size(), 500);
        assert_eq!(config.concurrency(), 2);
        assert!(!config.apply_schema_mapping());
        assert_eq!(config.export_filename(), "scored.csv");
        assert!(config.bundle_report());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_content = r#"
[pipeline]
name = "minimal"

[input]
path = "customers.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_endpoint(), DEFAULT_API_ENDPOINT);
        assert_eq!(config.batch_size(), 1500);
        assert_eq!(config.concurrency(), 1);
        assert!(config.apply_schema_mapping());
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.export_filename(), "results.csv");
        assert!(!config.bundle_report());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CHURN_TEST_API_ENDPOINT", "https://churn.test/api");

        let toml_content = r#"
[pipeline]
name = "env"

[source]
endpoint = "${CHURN_TEST_API_ENDPOINT}"

[input]
path = "${CHURN_TEST_UNDEFINED_VAR}.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.endpoint, "https://churn.test/api");
        assert_eq!(config.input.path, "${CHURN_TEST_UNDEFINED_VAR}.csv");

        std::env::remove_var("CHURN_TEST_API_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[pipeline]
name = "bad"

[source]
endpoint = "invalid-url"

[input]
path = "customers.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let zero_batch = r#"
[pipeline]
name = "bad"

[input]
path = "customers.csv"

[submit]
batch_size = 0
"#;
        let config = TomlConfig::from_toml_str(zero_batch).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_input_path_is_missing_config() {
        let toml_content = r#"
[pipeline]
name = "blank"

[input]
path = ""
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EtlError::MissingConfigError { ref field } if field == "input.path"));
        assert_eq!(err.user_friendly_message(), "Missing setting 'input.path'");
    }

    #[test]
    fn test_missing_input_section_fails_to_parse() {
        let err = TomlConfig::from_toml_str("[pipeline]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[pipeline]
name = "file-test"

[input]
path = "customers.csv"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
    }
}

use crate::core::directory::DEFAULT_MIN_SCORE;
use crate::core::MatchSettings;
use crate::utils::error::{Result, SwapError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATA_FILE: &str = "data.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: Option<String>,
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    pub limit: Option<usize>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

fn default_data_file() -> Option<String> {
    Some(DEFAULT_DATA_FILE.to_string())
}

fn default_true() -> bool {
    true
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SwapError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn data_file(&self) -> &str {
        self.storage.data_file.as_deref().unwrap_or(DEFAULT_DATA_FILE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let data_file = validation::validate_required_field("storage.data_file", &self.storage.data_file)?;
        validation::validate_path("storage.data_file", data_file)?;
        validation::validate_range("matching.min_score", self.matching.min_score, 0.0, 100.0)?;
        if let Some(level) = &self.logging.level {
            validation::validate_non_empty_string("logging.level", level)?;
        }
        Ok(())
    }
}

impl MatchSettings for TomlConfig {
    fn min_score(&self) -> f64 {
        self.matching.min_score
    }

    fn match_limit(&self) -> Option<usize> {
        self.matching.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.data_file(), "data.json");
        assert!(config.storage.pretty);
        assert_eq!(config.min_score(), 40.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config = TomlConfig::from_toml_str(
            r#"
            [storage]
            data_file = "/var/lib/skillswap/data.json"
            pretty = false

            [matching]
            min_score = 55.5
            limit = 3

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.data_file(), "/var/lib/skillswap/data.json");
        assert!(!config.storage.pretty);
        assert_eq!(config.match_limit(), Some(3));
        assert!(config.logging.json);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SKILLSWAP_TEST_DIR", "/tmp/swap");
        let config = TomlConfig::from_toml_str(
            "[storage]\ndata_file = \"${SKILLSWAP_TEST_DIR}/data.json\"\n",
        )
        .unwrap();
        assert_eq!(config.data_file(), "/tmp/swap/data.json");
    }

    #[test]
    fn test_out_of_range_min_score_is_rejected() {
        let config = TomlConfig::from_toml_str("[matching]\nmin_score = 140.0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = TomlConfig::from_toml_str("[storage\n").unwrap_err();
        assert!(matches!(err, SwapError::TomlError(_)));
    }
}

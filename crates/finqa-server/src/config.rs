//! Configuration for the finqa server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (port, store path, model, cache, logging)
//! 2. .env file - secrets (HF_API_TOKEN)
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const API_TOKEN_VAR: &str = "HF_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Analytical store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// DuckDB file, opened read-only
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/processed/financial_data.db".to_string(),
        }
    }
}

/// Language-model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions base URL
    pub api_base: String,
    pub model: String,
    pub sql_max_tokens: u32,
    pub answer_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://router.huggingface.co/v1".to_string(),
            model: "Qwen/Qwen2.5-7B-Instruct".to_string(),
            sql_max_tokens: finqa_llm::sql::DEFAULT_SQL_MAX_TOKENS,
            answer_max_tokens: finqa_llm::answer::DEFAULT_ANSWER_MAX_TOKENS,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: finqa_core::DEFAULT_TTL_SECS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means defaults plus environment
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override values from `var`; unparseable numbers are ignored
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("FINQA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("FINQA_SERVER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(path) = var("FINQA_DB_PATH") {
            self.database.path = path;
        }

        if let Some(api_base) = var("FINQA_LLM_API_BASE") {
            self.llm.api_base = api_base;
        }
        if let Some(model) = var("FINQA_LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(ttl) = var("FINQA_CACHE_TTL_SECS").and_then(|t| t.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }

        if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(output) = var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Language-model API token from environment (normally via .env)
    pub fn get_api_token() -> Result<String, ConfigError> {
        std::env::var(API_TOKEN_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(API_TOKEN_VAR.to_string()))
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, "data/processed/financial_data.db");
        assert_eq!(config.llm.model, "Qwen/Qwen2.5-7B-Instruct");
        assert_eq!(config.llm.sql_max_tokens, 512);
        assert_eq!(config.llm.answer_max_tokens, 300);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config_yaml = r#"
server:
  port: 9000
database:
  path: "/srv/finqa/financial_data.db"
"#;
        let temp_file = std::env::temp_dir().join("finqa_partial_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let mut config: Config =
            serde_yaml::from_str(&std::fs::read_to_string(&temp_file).unwrap()).unwrap();
        config.apply_overrides(|_| None);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.path, "/srv/finqa/financial_data.db");
        assert_eq!(config.llm.api_base, "https://router.huggingface.co/v1");
        assert_eq!(config.cache.ttl_secs, 3600);

        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_env_var_override() {
        let env: HashMap<&str, &str> = [
            ("FINQA_SERVER_PORT", "9090"),
            ("FINQA_DB_PATH", "/tmp/other.db"),
            ("FINQA_LLM_MODEL", "meta-llama/Llama-3.1-8B-Instruct"),
            ("FINQA_CACHE_TTL_SECS", "60"),
            ("LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.path, "/tmp/other.db");
        assert_eq!(config.llm.model, "meta-llama/Llama-3.1-8B-Instruct");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_bad_numeric_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "FINQA_SERVER_PORT" => Some("not-a-port".to_string()),
            "FINQA_CACHE_TTL_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("finqa_config_that_does_not_exist.yaml");
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.llm.timeout_secs, 60);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_file = std::env::temp_dir().join("finqa_invalid_config.yaml");
        std::fs::write(&temp_file, "server: [unclosed").unwrap();

        let err = Config::load(&temp_file).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));

        std::fs::remove_file(temp_file).ok();
    }
}

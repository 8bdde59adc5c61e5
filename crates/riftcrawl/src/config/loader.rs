use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// `~/.riftcrawl/config.json`, when a home directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".riftcrawl").join("config.json"))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.pipeline.concurrency == 0 {
        return Err(ConfigError::Validation {
            message: "pipeline.concurrency must be at least 1".to_string(),
        });
    }

    if config.pipeline.bulk_chunk_size == 0 {
        return Err(ConfigError::Validation {
            message: "pipeline.bulk_chunk_size must be at least 1".to_string(),
        });
    }

    if !config.riot.base_url.contains("{route}") {
        return Err(ConfigError::Validation {
            message: format!(
                "riot.base_url must contain a {{route}} placeholder: {}",
                config.riot.base_url
            ),
        });
    }

    if let Err(e) = reqwest::Url::parse(&config.couchdb.url) {
        return Err(ConfigError::Validation {
            message: format!("Invalid couchdb.url '{}': {}", config.couchdb.url, e),
        });
    }

    Ok(())
}

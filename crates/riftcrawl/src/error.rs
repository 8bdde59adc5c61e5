use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum RiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Missing credentials for {service}: {source}")]
    Credentials {
        service: &'static str,
        #[source]
        source: SecretError,
    },

    #[error("Document store read failed for '{path}': {reason}")]
    Read { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RiftError>;

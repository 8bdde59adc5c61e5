use serde::{Deserialize, Serialize};

use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub riot: RiotConfig,
    pub couchdb: CouchDbConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl Config {
    /// Configuration for runs that never leave the process (`--dry-run`).
    pub fn offline() -> Self {
        Self {
            version: "1.0".to_string(),
            riot: RiotConfig::default(),
            couchdb: CouchDbConfig {
                url: "http://127.0.0.1:5984".to_string(),
                username: None,
                password: SecretSource::default(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            pipeline: PipelineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Host template; `{route}` is replaced by the lowercase route tag.
    #[serde(default = "default_riot_base_url")]
    pub base_url: String,
    #[serde(default = "default_riot_api_key")]
    pub api_key: SecretSource,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_riot_base_url() -> String {
    "https://{route}.api.riotgames.com".to_string()
}

fn default_riot_api_key() -> SecretSource {
    SecretSource::from_env_var("RIOT_API_KEY")
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            base_url: default_riot_base_url(),
            api_key: default_riot_api_key(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDbConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: SecretSource,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Units in flight at once inside a step. 1 runs units sequentially.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Whole-run deadline. Units started after it expire are logged as FAILED.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
    #[serde(default = "default_bulk_chunk_size")]
    pub bulk_chunk_size: usize,
    #[serde(default = "default_match_ids_per_player")]
    pub match_ids_per_player: u32,
}

fn default_concurrency() -> usize {
    1
}

fn default_bulk_chunk_size() -> usize {
    500
}

fn default_match_ids_per_player() -> u32 {
    20
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            run_timeout_secs: None,
            bulk_chunk_size: default_bulk_chunk_size(),
            match_ids_per_player: default_match_ids_per_player(),
        }
    }
}

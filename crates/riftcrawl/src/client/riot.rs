use std::time::Duration;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::{ApiResponse, StatsApi};
use crate::config::RiotConfig;
use crate::error::ClientError;
use crate::pipeline::RunControl;

const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";

/// Maximum length for error bodies carried into step log messages.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Blocking client for the Riot developer API.
pub struct RiotApiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    request_timeout: Duration,
}

impl RiotApiClient {
    /// Builds a client from config, resolving the API key from its source.
    pub fn new(config: &RiotConfig) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .resolve()
            .map_err(|source| ClientError::Credentials {
                service: "riot",
                source,
            })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &RiotConfig, api_key: SecretString) -> Result<Self, ClientError> {
        if !config.base_url.contains("{route}") {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "missing {route} placeholder".to_string(),
            });
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("riftcrawl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Full URL for `path` on the host serving `route_tag`.
    pub fn url_for(&self, path: &str, route_tag: &str) -> String {
        let host = self
            .base_url
            .replace("{route}", &route_tag.to_ascii_lowercase());
        format!("{}{}", host.trim_end_matches('/'), path)
    }
}

impl StatsApi for RiotApiClient {
    fn send_request(&self, path: &str, route_tag: &str, control: &RunControl) -> ApiResponse {
        if control.is_cancelled() {
            return ApiResponse::cancelled();
        }

        let url = self.url_for(path, route_tag);
        let timeout = control.timeout_for(self.request_timeout);
        debug!("GET {} (timeout {:?})", url, timeout);

        let response = match self
            .http
            .get(&url)
            .header(RIOT_TOKEN_HEADER, self.api_key.expose_secret())
            .timeout(timeout)
            .send()
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ApiResponse::failed(None, format!("timed out after {:?}", timeout))
            }
            Err(e) => return ApiResponse::failed(None, e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return ApiResponse::failed(
                Some(status.as_u16()),
                format!("HTTP {}: {}", status, truncate(&body)),
            );
        }

        match response.json::<Value>() {
            Ok(body) => ApiResponse::successful(Some(status.as_u16()), Some(body)),
            Err(e) => ApiResponse::failed(
                Some(status.as_u16()),
                format!("invalid JSON body: {}", e),
            ),
        }
    }
}

pub(crate) fn truncate(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

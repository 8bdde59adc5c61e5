use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::riot::truncate;
use super::{DocumentStore, StoreResponse};
use crate::config::CouchDbConfig;
use crate::error::ClientError;
use crate::pipeline::RunControl;

/// Blocking CouchDB client.
///
/// `bulk_put` upserts: it looks up current revisions with `_all_docs` and
/// attaches them before posting to `_bulk_docs`, so re-persisting a
/// synthetic id replaces the document instead of conflicting.
pub struct CouchDbClient {
    http: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<SecretString>,
    request_timeout: Duration,
}

impl CouchDbClient {
    pub fn new(config: &CouchDbConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.url).map_err(|e| ClientError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        let password = config
            .password
            .resolve_optional()
            .map_err(|source| ClientError::Credentials {
                service: "couchdb",
                source,
            })?;

        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str, control: &RunControl) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url_for(path))
            .timeout(control.timeout_for(self.request_timeout));

        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref().map(|p| p.expose_secret())),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder) -> StoreResponse {
        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => return StoreResponse::failed(None, e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return StoreResponse::failed(
                Some(status.as_u16()),
                format!("HTTP {}: {}", status, truncate(&body)),
            );
        }

        match response.json::<Value>() {
            Ok(body) => StoreResponse::successful(Some(status.as_u16()), Some(body)),
            Err(e) => StoreResponse::failed(Some(status.as_u16()), format!("invalid JSON body: {}", e)),
        }
    }

    /// Current revision of each id that already exists in `db`.
    fn current_revisions(
        &self,
        db: &str,
        ids: &[&str],
        control: &RunControl,
    ) -> Result<Vec<Option<String>>, StoreResponse> {
        let lookup = self.send(
            self.request(Method::POST, &format!("/{}/_all_docs", db), control)
                .json(&json!({ "keys": ids })),
        );

        if lookup.http_status == Some(StatusCode::NOT_FOUND.as_u16()) {
            info!("Creating missing database '{}'", db);
            let created = self.send(self.request(Method::PUT, &format!("/{}", db), control));
            if !created.is_successful() {
                return Err(created);
            }
            return Ok(vec![None; ids.len()]);
        }

        if !lookup.is_successful() {
            return Err(lookup);
        }

        let rows = lookup
            .body
            .as_ref()
            .and_then(|body| body.get("rows"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .map(|id| {
                rows.iter()
                    .find(|row| row.get("key").and_then(Value::as_str) == Some(*id))
                    .and_then(|row| row.pointer("/value/rev"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect())
    }
}

impl DocumentStore for CouchDbClient {
    fn send_get(&self, path: &str, control: &RunControl) -> StoreResponse {
        if control.is_cancelled() {
            return StoreResponse::cancelled();
        }
        debug!("GET {}", path);
        self.send(self.request(Method::GET, path, control))
    }

    fn bulk_put(&self, db: &str, docs: &[Value], control: &RunControl) -> StoreResponse {
        if control.is_cancelled() {
            return StoreResponse::cancelled();
        }

        let mut ids = Vec::with_capacity(docs.len());
        for (position, doc) in docs.iter().enumerate() {
            match doc.get("_id").and_then(Value::as_str) {
                Some(id) => ids.push(id),
                None => {
                    return StoreResponse::failed(None, format!("document {} has no _id", position))
                }
            }
        }

        let revisions = match self.current_revisions(db, &ids, control) {
            Ok(revisions) => revisions,
            Err(response) => return response,
        };

        let docs: Vec<Value> = docs
            .iter()
            .zip(revisions)
            .map(|(doc, rev)| {
                let mut doc = doc.clone();
                if let (Some(rev), Some(obj)) = (rev, doc.as_object_mut()) {
                    obj.insert("_rev".to_string(), Value::String(rev));
                }
                doc
            })
            .collect();

        debug!("POST /{}/_bulk_docs ({} docs)", db, docs.len());
        let response = self.send(
            self.request(Method::POST, &format!("/{}/_bulk_docs", db), control)
                .json(&json!({ "docs": docs })),
        );

        match rejected_documents(&response) {
            Some(message) => StoreResponse::failed(response.http_status, message),
            None => response,
        }
    }
}

/// `_bulk_docs` answers 201 even when individual documents were rejected.
fn rejected_documents(response: &StoreResponse) -> Option<String> {
    let results = response.body.as_ref()?.as_array()?;
    let rejected: Vec<&Value> = results.iter().filter(|r| r.get("error").is_some()).collect();
    let first = rejected.first()?;

    Some(format!(
        "{} of {} documents rejected, first: {} ({})",
        rejected.len(),
        results.len(),
        first.get("id").and_then(Value::as_str).unwrap_or("?"),
        first.get("reason").and_then(Value::as_str).unwrap_or("no reason given"),
    ))
}

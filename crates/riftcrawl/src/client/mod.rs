//! Collaborators the pipelines talk to: the stats API and the document store.
//!
//! Both are narrow, blocking contracts that never return `Err`: transport
//! problems come back as a FAILED [`ApiResponse`] so steps can fold them into
//! their logs like any other unit outcome.

pub mod couch;
pub mod memory;
pub mod riot;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DocumentKind;
use crate::pipeline::{RunControl, UnitError};

pub use couch::CouchDbClient;
pub use memory::MemoryStore;
pub use riot::RiotApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Successful,
    Failed,
}

/// Outcome of one call to a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: RequestStatus,
    pub http_status: Option<u16>,
    pub body: Option<Value>,
    pub error: Option<String>,
}

/// Document store calls report the same shape as stats API calls.
pub type StoreResponse = ApiResponse;

impl ApiResponse {
    pub fn successful(http_status: Option<u16>, body: Option<Value>) -> Self {
        Self {
            status: RequestStatus::Successful,
            http_status,
            body,
            error: None,
        }
    }

    pub fn failed(http_status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Failed,
            http_status,
            body: None,
            error: Some(error.into()),
        }
    }

    /// Response for a call that was never sent because the run was cancelled.
    pub fn cancelled() -> Self {
        Self::failed(None, "cancelled before request was sent")
    }

    pub fn is_successful(&self) -> bool {
        self.status == RequestStatus::Successful
    }

    pub fn error_message(&self) -> String {
        match (&self.error, self.http_status) {
            (Some(error), _) => error.clone(),
            (None, Some(code)) => format!("HTTP {}", code),
            (None, None) => "unknown error".to_string(),
        }
    }

    /// Body of a successful stats API response.
    pub fn into_api_body(self) -> Result<Value, UnitError> {
        if !self.is_successful() {
            return Err(UnitError::Transport(self.error_message()));
        }
        self.body
            .ok_or_else(|| UnitError::Malformed("empty response body".to_string()))
    }

    /// Body of a successful document store response.
    pub fn into_store_body(self) -> Result<Value, UnitError> {
        if !self.is_successful() {
            return Err(UnitError::Store(self.error_message()));
        }
        self.body
            .ok_or_else(|| UnitError::Store("empty response body".to_string()))
    }
}

/// Client for the Riot stats API.
pub trait StatsApi: Send + Sync {
    /// GETs `path` from the host for `route_tag` (a region or platform tag).
    fn send_request(&self, path: &str, route_tag: &str, control: &RunControl) -> ApiResponse;
}

/// Client for the document store.
pub trait DocumentStore: Send + Sync {
    fn send_get(&self, path: &str, control: &RunControl) -> StoreResponse;

    /// Writes `docs` into `db`. Each doc carries its own `_id`; writing an id
    /// that already exists replaces the stored document.
    fn bulk_put(&self, db: &str, docs: &[Value], control: &RunControl) -> StoreResponse;
}

/// Documents read back from an `_all_docs` listing.
#[derive(Debug)]
pub struct AllDocs<T> {
    pub docs: Vec<T>,
    /// Rows whose document did not deserialize as `T`.
    pub skipped: usize,
}

/// Reads every document of `kind`, at most `limit` rows.
///
/// Design documents are ignored. Rows that fail to deserialize are counted
/// in `skipped` rather than failing the whole read.
pub fn read_all_docs<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    kind: DocumentKind,
    limit: Option<usize>,
    control: &RunControl,
) -> Result<AllDocs<T>, UnitError> {
    let path = kind.all_docs_path(limit);
    let body = store.send_get(&path, control).into_store_body()?;

    let rows = body
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| UnitError::Malformed(format!("{} listing has no rows array", kind.database())))?;

    let mut docs = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in rows {
        let is_design = row
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| id.starts_with("_design/"));
        if is_design {
            continue;
        }

        match row.get("doc").cloned().map(serde_json::from_value::<T>) {
            Some(Ok(doc)) => docs.push(doc),
            _ => skipped += 1,
        }
    }

    Ok(AllDocs { docs, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_api_body_classifies_failures() {
        let failed = ApiResponse::failed(Some(429), "HTTP 429 Too Many Requests");
        assert_eq!(
            failed.into_api_body(),
            Err(UnitError::Transport("HTTP 429 Too Many Requests".into()))
        );

        let empty = ApiResponse::successful(Some(200), None);
        assert!(matches!(empty.into_api_body(), Err(UnitError::Malformed(_))));

        let ok = ApiResponse::successful(Some(200), Some(json!([1])));
        assert_eq!(ok.into_api_body().unwrap(), json!([1]));
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let response = ApiResponse {
            status: RequestStatus::Failed,
            http_status: Some(503),
            body: None,
            error: None,
        };
        assert_eq!(response.error_message(), "HTTP 503");
    }

    #[test]
    fn test_store_failure_maps_to_store_error() {
        let response = StoreResponse::failed(Some(404), "not_found");
        assert_eq!(
            response.into_store_body(),
            Err(UnitError::Store("not_found".into()))
        );
    }

    #[test]
    fn test_read_all_docs_skips_design_and_bad_rows() {
        #[derive(Deserialize)]
        struct Doc {
            name: String,
        }

        let store = MemoryStore::new();
        store.create_database("championdetails");
        store.insert("championdetails", json!({"_id": "a", "name": "Ahri"}));
        store.insert("championdetails", json!({"_id": "_design/views", "views": {}}));
        store.insert("championdetails", json!({"_id": "b", "unexpected": 1}));

        let all: AllDocs<Doc> =
            read_all_docs(&store, DocumentKind::ChampionDetails, None, &RunControl::new()).unwrap();
        assert_eq!(all.docs.len(), 1);
        assert_eq!(all.docs[0].name, "Ahri");
        assert_eq!(all.skipped, 1);
    }

    #[test]
    fn test_read_all_docs_missing_database() {
        let store = MemoryStore::new();
        let err = read_all_docs::<Value>(&store, DocumentKind::Player, None, &RunControl::new())
            .unwrap_err();
        assert!(matches!(err, UnitError::Store(_)));
    }
}

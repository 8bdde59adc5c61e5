use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};

use super::{DocumentStore, StoreResponse};
use crate::pipeline::RunControl;

type Database = BTreeMap<String, Value>;

/// In-process document store with CouchDB-shaped responses.
///
/// Used for `--dry-run` and by tests. Reading a database that was never
/// created answers 404 like CouchDB does; writing creates it.
#[derive(Default)]
pub struct MemoryStore {
    databases: Mutex<BTreeMap<String, Database>>,
    revision: AtomicUsize,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with every database the pipelines use already created.
    pub fn with_pipeline_databases() -> Self {
        let store = Self::new();
        for db in ["players", "playermatches", "matchdetails", "championdetails"] {
            store.create_database(db);
        }
        store
    }

    pub fn create_database(&self, db: &str) {
        self.lock().entry(db.to_string()).or_default();
    }

    /// Stores `doc` under its `_id`, bypassing `bulk_put`.
    pub fn insert(&self, db: &str, doc: Value) {
        let rev = self.next_rev();
        let mut databases = self.lock();
        let database = databases.entry(db.to_string()).or_default();
        if let Some(id) = doc.get("_id").and_then(Value::as_str).map(str::to_string) {
            database.insert(id, with_rev(doc, &rev));
        }
    }

    pub fn get(&self, db: &str, id: &str) -> Option<Value> {
        self.lock().get(db).and_then(|d| d.get(id).cloned())
    }

    pub fn ids(&self, db: &str) -> Vec<String> {
        self.lock()
            .get(db)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, db: &str) -> usize {
        self.lock().get(db).map(|d| d.len()).unwrap_or(0)
    }

    /// Makes every following `bulk_put` fail until switched back.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of `bulk_put` calls that reached the store.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Database>> {
        // A panic while holding the lock leaves the maps consistent.
        self.databases.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_rev(&self) -> String {
        format!("{}-mem", self.revision.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn all_docs(&self, db: &str, query: &str) -> StoreResponse {
        let mut include_docs = false;
        let mut limit = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some(("include_docs", v)) => include_docs = v == "true",
                Some(("limit", v)) => match v.parse::<usize>() {
                    Ok(n) => limit = Some(n),
                    Err(_) => return StoreResponse::failed(Some(400), format!("invalid limit '{}'", v)),
                },
                _ => {}
            }
        }

        let databases = self.lock();
        let Some(database) = databases.get(db) else {
            return StoreResponse::failed(Some(404), format!("not_found: database '{}' does not exist", db));
        };

        let rows: Vec<Value> = database
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, doc)| {
                let rev = doc.get("_rev").cloned().unwrap_or(Value::Null);
                let mut row = json!({ "id": id, "key": id, "value": { "rev": rev } });
                if include_docs {
                    row["doc"] = doc.clone();
                }
                row
            })
            .collect();

        StoreResponse::successful(
            Some(200),
            Some(json!({ "total_rows": database.len(), "offset": 0, "rows": rows })),
        )
    }
}

impl DocumentStore for MemoryStore {
    fn send_get(&self, path: &str, control: &RunControl) -> StoreResponse {
        if control.is_cancelled() {
            return StoreResponse::cancelled();
        }

        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            [db, "_all_docs"] => self.all_docs(db, query),
            [db, id] => match self.get(db, id) {
                Some(doc) => StoreResponse::successful(Some(200), Some(doc)),
                None => StoreResponse::failed(Some(404), "not_found: missing"),
            },
            _ => StoreResponse::failed(Some(400), format!("unsupported path '{}'", path)),
        }
    }

    fn bulk_put(&self, db: &str, docs: &[Value], control: &RunControl) -> StoreResponse {
        if control.is_cancelled() {
            return StoreResponse::cancelled();
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.reject_writes.load(Ordering::SeqCst) {
            return StoreResponse::failed(Some(503), "service_unavailable: writes rejected");
        }

        if let Some(position) = docs
            .iter()
            .position(|d| d.get("_id").and_then(Value::as_str).is_none())
        {
            return StoreResponse::failed(Some(400), format!("bad_request: document {} has no _id", position));
        }

        let mut results = Vec::with_capacity(docs.len());
        for doc in docs {
            let rev = self.next_rev();
            let id = doc.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
            self.lock()
                .entry(db.to_string())
                .or_default()
                .insert(id.clone(), with_rev(doc.clone(), &rev));
            results.push(json!({ "ok": true, "id": id, "rev": rev }));
        }

        StoreResponse::successful(Some(201), Some(Value::Array(results)))
    }
}

fn with_rev(mut doc: Value, rev: &str) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("_rev".to_string(), Value::String(rev.to_string()));
    }
    doc
}

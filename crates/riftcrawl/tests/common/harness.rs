//! Test harness for pipeline runs without network or database.
//!
//! `TestHarness` wires a [`FakeRiot`] and a [`MemoryStore`] into a
//! [`PipelineService`] and exposes both for assertions.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use riftcrawl::client::ApiResponse;
use riftcrawl::config::PipelineSettings;
use riftcrawl::{MemoryStore, PipelineService, RunControl, StatsApi};

/// Stats API answering from a path table. Unknown paths get a 404.
#[derive(Default)]
pub struct FakeRiot {
    responses: Mutex<HashMap<String, ApiResponse>>,
    calls: AtomicUsize,
    /// Cancels the given control once this many requests were answered.
    cancel_after: Mutex<Option<(usize, RunControl)>>,
}

impl FakeRiot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&self, path: impl Into<String>, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.into(), ApiResponse::successful(Some(200), Some(body)));
    }

    pub fn fail(&self, path: impl Into<String>, code: u16) {
        self.responses.lock().unwrap().insert(
            path.into(),
            ApiResponse::failed(Some(code), format!("HTTP {}", code)),
        );
    }

    pub fn cancel_after(&self, calls: usize, control: &RunControl) {
        *self.cancel_after.lock().unwrap() = Some((calls, control.clone()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatsApi for FakeRiot {
    fn send_request(&self, path: &str, _route_tag: &str, control: &RunControl) -> ApiResponse {
        if control.is_cancelled() {
            return ApiResponse::cancelled();
        }

        let answered = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| ApiResponse::failed(Some(404), "HTTP 404 Not Found"));

        if let Some((limit, handle)) = self.cancel_after.lock().unwrap().as_ref() {
            if answered >= *limit {
                handle.cancel();
            }
        }
        response
    }
}

/// Isolated pipeline environment: fake API, in-memory store, service.
pub struct TestHarness {
    pub api: Arc<FakeRiot>,
    pub store: Arc<MemoryStore>,
    pub settings: PipelineSettings,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(PipelineSettings::default())
    }

    pub fn with_settings(settings: PipelineSettings) -> Self {
        Self {
            api: Arc::new(FakeRiot::new()),
            store: Arc::new(MemoryStore::with_pipeline_databases()),
            settings,
        }
    }

    pub fn service(&self) -> PipelineService {
        PipelineService::new(self.api.clone(), self.store.clone(), self.settings.clone())
    }
}

//! Trigger interface: one operation per pipeline kind.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::broadcast::StepLogBroadcaster;
use crate::client::{CouchDbClient, DocumentStore, RiotApiClient, StatsApi};
use crate::config::{Config, PipelineSettings};
use crate::context::{
    BuildChampionAnalyticsContext, FetchMatchDetailsContext, FetchMatchesContext, FetchPlayersContext,
};
use crate::directors;
use crate::domain::{Division, MatchType, Queue, Region, Tier};
use crate::pipeline::{
    reduce, Director, FanoutSink, LogSink, LogSummary, PipelineError, RunContext, RunControl, RunScope,
    TracingSink,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPlayersRequest {
    pub region: Region,
    pub tier: Tier,
    pub division: Division,
    pub queue: Queue,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page")]
    pub page_count: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMatchesRequest {
    pub region: Region,
    pub player_limit: usize,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    #[serde(default)]
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMatchDetailsRequest {
    pub region: Region,
    pub player_match_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAnalyticsRequest {
    pub limit_matches: usize,
}

/// Builds a context and director per request, runs it, and reduces the logs.
///
/// Every operation returns the run's summary, whatever the individual units
/// did. An error means the run itself broke: a step aborted, or the summary
/// is missing steps the director declares.
pub struct PipelineService {
    api: Arc<dyn StatsApi>,
    store: Arc<dyn DocumentStore>,
    settings: PipelineSettings,
    sink: Arc<dyn LogSink>,
    broadcaster: Option<StepLogBroadcaster>,
}

impl PipelineService {
    pub fn new(api: Arc<dyn StatsApi>, store: Arc<dyn DocumentStore>, settings: PipelineSettings) -> Self {
        Self {
            api,
            store,
            settings,
            sink: Arc::new(TracingSink),
            broadcaster: None,
        }
    }

    /// Service talking to the Riot API and CouchDB as configured.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let store = CouchDbClient::new(&config.couchdb)?;
        Self::from_config_with_store(config, Arc::new(store))
    }

    /// Service talking to the Riot API as configured, persisting into `store`.
    pub fn from_config_with_store(config: &Config, store: Arc<dyn DocumentStore>) -> crate::Result<Self> {
        let api = RiotApiClient::new(&config.riot)?;
        Ok(Self::new(Arc::new(api), store, config.pipeline.clone()))
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Also streams every step log, tagged with its run id, to `broadcaster`.
    pub fn with_broadcaster(mut self, broadcaster: StepLogBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn fetch_players(
        &self,
        request: &FetchPlayersRequest,
        control: &RunControl,
    ) -> Result<LogSummary, PipelineError> {
        let director = directors::fetch_players(self.api.clone(), self.store.clone(), &self.settings);
        let mut ctx = FetchPlayersContext::new(
            request.region,
            request.tier,
            request.division,
            request.queue,
            request.page,
        )
        .with_page_count(request.page_count);
        self.run_director(&director, &mut ctx, control)
    }

    pub fn fetch_matches(
        &self,
        request: &FetchMatchesRequest,
        control: &RunControl,
    ) -> Result<LogSummary, PipelineError> {
        let director = directors::fetch_matches(self.api.clone(), self.store.clone(), &self.settings);
        let mut ctx = FetchMatchesContext::new(
            request.region,
            request.player_limit,
            request.match_type,
            request.tier,
        );
        self.run_director(&director, &mut ctx, control)
    }

    pub fn fetch_match_details(
        &self,
        request: &FetchMatchDetailsRequest,
        control: &RunControl,
    ) -> Result<LogSummary, PipelineError> {
        let director =
            directors::fetch_match_details(self.api.clone(), self.store.clone(), &self.settings);
        let mut ctx = FetchMatchDetailsContext::new(request.region, request.player_match_limit);
        self.run_director(&director, &mut ctx, control)
    }

    pub fn build_champion_analytics(
        &self,
        request: &BuildAnalyticsRequest,
        control: &RunControl,
    ) -> Result<LogSummary, PipelineError> {
        let director = directors::build_champion_analytics(self.store.clone(), &self.settings);
        let mut ctx = BuildChampionAnalyticsContext::new(request.limit_matches);
        self.run_director(&director, &mut ctx, control)
    }

    /// Runs `director` over a caller-owned context, so the caller can inspect
    /// the context afterwards.
    pub fn run_director<C: RunContext>(
        &self,
        director: &Director<C>,
        ctx: &mut C,
        control: &RunControl,
    ) -> Result<LogSummary, PipelineError> {
        let control = match self.settings.run_timeout_secs {
            Some(secs) => control.bounded_by(Duration::from_secs(secs)),
            None => control.clone(),
        };

        let tagged = self.broadcaster.as_ref().map(|b| b.for_run(ctx.run_id()));
        let mut sinks: Vec<&dyn LogSink> = vec![self.sink.as_ref()];
        if let Some(broadcaster) = &tagged {
            sinks.push(broadcaster);
        }
        let sink = FanoutSink::new(sinks);
        let scope = RunScope::new(&control, &sink).with_concurrency(self.settings.concurrency);

        director.start_work(ctx, &scope)?;

        let summary = reduce(ctx.logs());
        let missing = summary.missing_steps(&director.step_names());
        if !missing.is_empty() {
            return Err(PipelineError::IncompleteRun {
                pipeline: director.name(),
                missing,
            });
        }

        info!(
            "{} run {} finished: {} steps, {} failed units",
            ctx.kind(),
            ctx.run_id(),
            summary.steps.len(),
            summary.total_failed()
        );
        Ok(summary)
    }
}

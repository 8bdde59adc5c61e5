pub mod broadcast;
pub mod champions;
pub mod client;
pub mod config;
pub mod context;
pub mod directors;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod secrets;
pub mod service;
pub mod steps;

pub use broadcast::{StepLogBroadcaster, StepLogEvent};
pub use champions::all_champion_details;
pub use client::{CouchDbClient, DocumentStore, MemoryStore, RiotApiClient, StatsApi};
pub use config::{load_config, Config};
pub use error::{ClientError, ConfigError, Result, RiftError};
pub use pipeline::{
    reduce, Director, LogSummary, PipelineError, RunControl, StepLog, StepLogSummary, StepLogs, StepStatus,
};
pub use secrets::{resolve_secret, SecretError, SecretSource};
pub use service::{
    BuildAnalyticsRequest, FetchMatchDetailsRequest, FetchMatchesRequest, FetchPlayersRequest, PipelineService,
};

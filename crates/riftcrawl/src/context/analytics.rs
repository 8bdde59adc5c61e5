use std::collections::BTreeMap;

use crate::domain::{ChampionAnalytics, MatchDetail};
use crate::pipeline::StepLogs;

use super::new_run_id;

#[derive(Debug)]
pub struct BuildChampionAnalyticsContext {
    /// Maximum stored match details to aggregate.
    limit_matches: usize,
    run_id: String,

    pub matches: Vec<MatchDetail>,
    /// Per-champion statistics keyed by synthetic id.
    pub champion_analytics: BTreeMap<String, ChampionAnalytics>,

    pub logs: StepLogs,
}

impl BuildChampionAnalyticsContext {
    pub fn new(limit_matches: usize) -> Self {
        Self {
            limit_matches,
            run_id: new_run_id(),
            matches: Vec::new(),
            champion_analytics: BTreeMap::new(),
            logs: StepLogs::new(),
        }
    }

    pub fn limit_matches(&self) -> usize {
        self.limit_matches
    }
}

impl_run_context!(BuildChampionAnalyticsContext, "build-analytics");

use std::collections::BTreeMap;

use crate::domain::{MatchDetail, Region};
use crate::pipeline::StepLogs;

use super::new_run_id;

#[derive(Debug)]
pub struct FetchMatchDetailsContext {
    region: Region,
    /// Number of stored player match lists to take match ids from.
    player_match_limit: usize,
    run_id: String,

    pub match_ids: Vec<String>,
    /// Details as returned by the API, not yet validated.
    pub fetched_match_details: Vec<MatchDetail>,
    /// Validated details keyed by synthetic id.
    pub validated_match_details: BTreeMap<String, MatchDetail>,

    pub logs: StepLogs,
}

impl FetchMatchDetailsContext {
    pub fn new(region: Region, player_match_limit: usize) -> Self {
        Self {
            region,
            player_match_limit,
            run_id: new_run_id(),
            match_ids: Vec::new(),
            fetched_match_details: Vec::new(),
            validated_match_details: BTreeMap::new(),
            logs: StepLogs::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn player_match_limit(&self) -> usize {
        self.player_match_limit
    }
}

impl_run_context!(FetchMatchDetailsContext, "fetch-match-details");

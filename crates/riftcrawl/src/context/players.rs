use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Division, LeagueEntry, Player, Queue, Region, Tier};
use crate::pipeline::StepLogs;

use super::new_run_id;

#[derive(Debug)]
pub struct FetchPlayersContext {
    region: Region,
    tier: Tier,
    division: Division,
    queue: Queue,
    /// First league page to pull (1-based).
    page: u32,
    page_count: u32,
    run_id: String,

    pub league_entries: Vec<LeagueEntry>,
    /// Resolved players keyed by synthetic id.
    pub players: BTreeMap<String, Player>,
    pub existing_player_ids: BTreeSet<String>,
    pub new_player_ids: BTreeSet<String>,

    pub logs: StepLogs,
}

impl FetchPlayersContext {
    pub fn new(region: Region, tier: Tier, division: Division, queue: Queue, page: u32) -> Self {
        Self {
            region,
            tier,
            division,
            queue,
            page: page.max(1),
            page_count: 1,
            run_id: new_run_id(),
            league_entries: Vec::new(),
            players: BTreeMap::new(),
            existing_player_ids: BTreeSet::new(),
            new_player_ids: BTreeSet::new(),
            logs: StepLogs::new(),
        }
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count.max(1);
        self
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn division(&self) -> Division {
        self.division
    }

    pub fn queue(&self) -> Queue {
        self.queue
    }

    /// Pages this run pulls, in order.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.page..self.page.saturating_add(self.page_count)
    }
}

impl_run_context!(FetchPlayersContext, "fetch-players");

use std::collections::BTreeMap;

use crate::domain::{MatchType, PlayerMatches, Region, Tier};
use crate::pipeline::StepLogs;

use super::new_run_id;

#[derive(Debug)]
pub struct FetchMatchesContext {
    region: Region,
    player_limit: usize,
    match_type: MatchType,
    /// Only players of this tier, when set.
    tier: Option<Tier>,
    run_id: String,

    pub puuids: Vec<String>,
    pub fetched_matches: BTreeMap<String, PlayerMatches>,

    pub logs: StepLogs,
}

impl FetchMatchesContext {
    pub fn new(region: Region, player_limit: usize, match_type: MatchType, tier: Option<Tier>) -> Self {
        Self {
            region,
            player_limit,
            match_type,
            tier,
            run_id: new_run_id(),
            puuids: Vec::new(),
            fetched_matches: BTreeMap::new(),
            logs: StepLogs::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn player_limit(&self) -> usize {
        self.player_limit
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }
}

impl_run_context!(FetchMatchesContext, "fetch-matches");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RunContext;

    #[test]
    fn test_inputs_are_read_through_getters() {
        let mut ctx = FetchMatchesContext::new(Region::Asia, 25, MatchType::Normal, Some(Tier::Diamond));
        ctx.puuids.push("p1".into());

        assert_eq!(ctx.region(), Region::Asia);
        assert_eq!(ctx.player_limit(), 25);
        assert_eq!(ctx.match_type(), MatchType::Normal);
        assert_eq!(ctx.tier(), Some(Tier::Diamond));
        assert_eq!(ctx.kind(), "fetch-matches");
    }
}

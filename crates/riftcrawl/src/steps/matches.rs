use std::sync::Arc;

use crate::client::{read_all_docs, DocumentStore, StatsApi};
use crate::context::FetchMatchesContext;
use crate::domain::{DocumentKind, Player, PlayerMatches};
use crate::pipeline::{RunScope, Step, StepLog, UnitError};

use super::persist_chunked;

/// Loads the puuids to crawl from stored players of the run's region (and
/// tier, when given), capped at `player_limit`.
pub struct LoadPlayersStep {
    store: Arc<dyn DocumentStore>,
}

impl LoadPlayersStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Step<FetchMatchesContext> for LoadPlayersStep {
    fn name(&self) -> &'static str {
        "LoadPlayersStep"
    }

    fn execute(&self, ctx: &mut FetchMatchesContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let (outcome, elapsed) = scope.run_one(|| {
            read_all_docs::<Player>(self.store.as_ref(), DocumentKind::Player, None, scope.control())
        });

        let log = match outcome {
            Ok(stored) => {
                let region = ctx.region();
                let tier = ctx.tier();
                let selected: Vec<String> = stored
                    .docs
                    .into_iter()
                    .filter(|p| p.region == region)
                    .filter(|p| tier.map_or(true, |t| p.tier == t))
                    .map(|p| p.puuid)
                    .take(ctx.player_limit())
                    .collect();
                let message = format!(
                    "Loaded {} players for {} (skipped {} unreadable documents)",
                    selected.len(),
                    region,
                    stored.skipped
                );
                ctx.puuids.extend(selected);
                StepLog::successful(self.name(), message, elapsed)
            }
            Err(e) => StepLog::failed(
                self.name(),
                format!("Failed to load players - {}", e),
                elapsed,
            ),
        };
        scope.record(&mut ctx.logs, log);
    }
}

/// Pulls the match id list of every puuid, one request per puuid.
pub struct PullMatchesFromRiotStep {
    api: Arc<dyn StatsApi>,
    count: u32,
}

impl PullMatchesFromRiotStep {
    pub fn new(api: Arc<dyn StatsApi>, count: u32) -> Self {
        Self { api, count }
    }
}

impl Step<FetchMatchesContext> for PullMatchesFromRiotStep {
    fn name(&self) -> &'static str {
        "PullMatchesFromRiotStep"
    }

    fn execute(&self, ctx: &mut FetchMatchesContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let puuids = ctx.puuids.clone();
        let region = ctx.region();
        let match_type = ctx.match_type().api_name();

        let results = scope.run_units(puuids, |puuid| {
            let path = format!(
                "/lol/match/v5/matches/by-puuid/{}/ids?type={}&start=0&count={}",
                puuid, match_type, self.count
            );
            let body = self
                .api
                .send_request(&path, region.as_str(), scope.control())
                .into_api_body()?;
            serde_json::from_value::<Vec<String>>(body)
                .map_err(|e| UnitError::Malformed(format!("match id list: {}", e)))
        });

        for result in results {
            let puuid = result.unit;
            let log = match result.outcome {
                Ok(match_ids) => {
                    let message =
                        format!("Fetched {} match ids for puuid: {}", match_ids.len(), puuid);
                    let player_matches = PlayerMatches::new(region, &puuid, match_ids);
                    ctx.fetched_matches
                        .insert(player_matches.id.clone(), player_matches);
                    StepLog::successful(self.name(), message, result.elapsed)
                }
                Err(e) => StepLog::failed(
                    self.name(),
                    format!("Failed to fetch matches for puuid: {} - {}", puuid, e),
                    result.elapsed,
                ),
            };
            scope.record(&mut ctx.logs, log);
        }
    }
}

pub struct PersistPlayerMatchesStep {
    store: Arc<dyn DocumentStore>,
    chunk_size: usize,
}

impl PersistPlayerMatchesStep {
    pub fn new(store: Arc<dyn DocumentStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }
}

impl Step<FetchMatchesContext> for PersistPlayerMatchesStep {
    fn name(&self) -> &'static str {
        "PersistPlayerMatchesStep"
    }

    fn execute(&self, ctx: &mut FetchMatchesContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());
        persist_chunked(
            self.name(),
            self.store.as_ref(),
            DocumentKind::PlayerMatches,
            ctx.fetched_matches.values(),
            self.chunk_size,
            &mut ctx.logs,
            scope,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStore;
    use crate::domain::{MatchType, Region, Tier};
    use crate::pipeline::{NoopSink, RunControl, StepStatus};
    use crate::steps::testing::ScriptedApi;
    use serde_json::json;

    fn ids_path(puuid: &str) -> String {
        format!(
            "/lol/match/v5/matches/by-puuid/{}/ids?type=ranked&start=0&count=20",
            puuid
        )
    }

    fn stored_player(store: &MemoryStore, puuid: &str, region: &str, tier: &str) {
        store.insert(
            "players",
            json!({
                "_id": format!("player:{}:{}", region, puuid), "puuid": puuid, "region": region,
                "tier": tier, "division": "II", "queue": "RANKED_SOLO"
            }),
        );
    }

    #[test]
    fn test_load_players_filters_region_tier_and_limit() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        stored_player(&store, "a", "EUROPE", "GOLD");
        stored_player(&store, "b", "EUROPE", "SILVER");
        stored_player(&store, "c", "AMERICAS", "GOLD");
        stored_player(&store, "d", "EUROPE", "GOLD");
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);

        let mut ctx = FetchMatchesContext::new(Region::Europe, 10, MatchType::Ranked, Some(Tier::Gold));
        LoadPlayersStep::new(store.clone()).execute(&mut ctx, &scope);
        assert_eq!(ctx.puuids, vec!["a", "d"]);

        let mut limited = FetchMatchesContext::new(Region::Europe, 1, MatchType::Ranked, None);
        LoadPlayersStep::new(store).execute(&mut limited, &scope);
        assert_eq!(limited.puuids.len(), 1);
        assert_eq!(limited.logs.get("LoadPlayersStep").unwrap().len(), 1);
    }

    #[test]
    fn test_pull_matches_m_units_k_failures() {
        let api = Arc::new(
            ScriptedApi::new()
                .ok(&ids_path("a"), json!(["EUW1_1", "EUW1_2"]))
                .fail(&ids_path("b"), 503)
                .ok(&ids_path("c"), json!([]))
                .ok(&ids_path("d"), json!({ "not": "a list" })),
        );
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink).with_concurrency(3);
        let mut ctx = FetchMatchesContext::new(Region::Europe, 10, MatchType::Ranked, None);
        ctx.puuids = vec!["a".into(), "b".into(), "c".into(), "d".into()];

        PullMatchesFromRiotStep::new(api, 20).execute(&mut ctx, &scope);

        let logs = ctx.logs.get("PullMatchesFromRiotStep").unwrap();
        assert_eq!(logs.len(), 4);
        assert_eq!(logs.iter().filter(|l| l.status == StepStatus::Failed).count(), 2);
        assert_eq!(ctx.fetched_matches.len(), 2);
        assert_eq!(
            ctx.fetched_matches["playerMatches:EUROPE:a"].match_ids,
            vec!["EUW1_1", "EUW1_2"]
        );
        assert!(!ctx.fetched_matches.contains_key("playerMatches:EUROPE:b"));
        assert_eq!(logs[0].message, "Fetched 2 match ids for puuid: a");
    }

    #[test]
    fn test_persist_player_matches() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchesContext::new(Region::Europe, 10, MatchType::Ranked, None);
        let pm = PlayerMatches::new(Region::Europe, "a", vec!["EUW1_1".into()]);
        ctx.fetched_matches.insert(pm.id.clone(), pm);

        PersistPlayerMatchesStep::new(store.clone(), 10).execute(&mut ctx, &scope);

        let doc = store.get("playermatches", "playerMatches:EUROPE:a").unwrap();
        assert_eq!(doc["matchIds"], json!(["EUW1_1"]));
    }
}

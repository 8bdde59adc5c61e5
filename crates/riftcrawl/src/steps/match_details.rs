use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::client::{read_all_docs, DocumentStore, StatsApi};
use crate::context::FetchMatchDetailsContext;
use crate::domain::{is_valid_match_id, DocumentKind, MatchDetail, PlayerMatches};
use crate::pipeline::{RunScope, Step, StepLog, UnitError};

use super::persist_chunked;

/// Collects match ids from stored player match lists of the run's region.
/// Duplicates and ids that do not look like Riot match ids are dropped.
pub struct LoadPlayerMatchesStep {
    store: Arc<dyn DocumentStore>,
}

impl LoadPlayerMatchesStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Step<FetchMatchDetailsContext> for LoadPlayerMatchesStep {
    fn name(&self) -> &'static str {
        "LoadPlayerMatchesStep"
    }

    fn execute(&self, ctx: &mut FetchMatchDetailsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let (outcome, elapsed) = scope.run_one(|| {
            read_all_docs::<PlayerMatches>(
                self.store.as_ref(),
                DocumentKind::PlayerMatches,
                None,
                scope.control(),
            )
        });

        let log = match outcome {
            Ok(stored) => {
                let lists: Vec<PlayerMatches> = stored
                    .docs
                    .into_iter()
                    .filter(|pm| pm.region == ctx.region())
                    .take(ctx.player_match_limit())
                    .collect();

                let mut seen: BTreeSet<String> = ctx.match_ids.iter().cloned().collect();
                let mut dropped = 0;
                for id in lists.iter().flat_map(|pm| pm.match_ids.iter()) {
                    if !is_valid_match_id(id) {
                        dropped += 1;
                    } else if seen.insert(id.clone()) {
                        ctx.match_ids.push(id.clone());
                    }
                }

                StepLog::successful(
                    self.name(),
                    format!(
                        "Loaded {} match ids from {} player match lists (dropped {} malformed ids)",
                        ctx.match_ids.len(),
                        lists.len(),
                        dropped
                    ),
                    elapsed,
                )
            }
            Err(e) => StepLog::failed(
                self.name(),
                format!("Failed to load player matches - {}", e),
                elapsed,
            ),
        };
        scope.record(&mut ctx.logs, log);
    }
}

/// Fetches the details of every match id, one request per match.
pub struct PullMatchDetailsStep {
    api: Arc<dyn StatsApi>,
}

impl PullMatchDetailsStep {
    pub fn new(api: Arc<dyn StatsApi>) -> Self {
        Self { api }
    }
}

impl Step<FetchMatchDetailsContext> for PullMatchDetailsStep {
    fn name(&self) -> &'static str {
        "PullMatchDetailsStep"
    }

    fn execute(&self, ctx: &mut FetchMatchDetailsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let match_ids = ctx.match_ids.clone();
        let region = ctx.region();

        let results = scope.run_units(match_ids, |match_id| {
            let path = format!("/lol/match/v5/matches/{}", match_id);
            let body = self
                .api
                .send_request(&path, region.as_str(), scope.control())
                .into_api_body()?;
            if !body.is_object() {
                return Err(UnitError::Malformed("match details is not an object".to_string()));
            }
            let detail = serde_json::from_value::<MatchDetail>(body)
                .map_err(|e| UnitError::Malformed(format!("match details: {}", e)))?;
            match detail.match_id() {
                Some(returned) if returned != match_id.as_str() => Err(UnitError::Malformed(format!(
                    "match details id {} does not match requested match",
                    returned
                ))),
                _ => Ok(detail),
            }
        });

        for result in results {
            let log = match result.outcome {
                Ok(detail) => {
                    ctx.fetched_match_details.push(detail);
                    StepLog::successful(
                        self.name(),
                        format!("Fetched match details for match: {}", result.unit),
                        result.elapsed,
                    )
                }
                Err(e) => StepLog::failed(
                    self.name(),
                    format!("Failed to fetch match details for match: {} - {}", result.unit, e),
                    result.elapsed,
                ),
            };
            scope.record(&mut ctx.logs, log);
        }
    }
}

/// Single validation pass over the fetched details.
///
/// Each detail without `metadata.matchId` gets a FAILED log and is skipped;
/// the pass ends with one SUCCESSFUL log summarising the counts. The
/// validated count is the growth of `validated_match_details`, so repeated
/// ids count once.
pub struct ValidateMatchDetailsStep;

impl Step<FetchMatchDetailsContext> for ValidateMatchDetailsStep {
    fn name(&self) -> &'static str {
        "ValidateMatchDetailsStep"
    }

    fn execute(&self, ctx: &mut FetchMatchDetailsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let start = Instant::now();
        let before = ctx.validated_match_details.len();
        let mut skipped = 0;

        for detail in &ctx.fetched_match_details {
            let item_start = Instant::now();
            let Some(match_id) = detail.match_id() else {
                scope.record(
                    &mut ctx.logs,
                    StepLog::failed(
                        self.name(),
                        "Invalid match details - missing metadata.matchId",
                        item_start.elapsed(),
                    ),
                );
                skipped += 1;
                continue;
            };

            let key = DocumentKind::MatchDetail.regional_key(ctx.region(), match_id);
            let mut detail = detail.clone();
            detail.id = Some(key.clone());
            ctx.validated_match_details.insert(key, detail);
        }

        let validated = ctx.validated_match_details.len() - before;
        scope.record(
            &mut ctx.logs,
            StepLog::successful(
                self.name(),
                format!("Validated count: {} skipped: {}", validated, skipped),
                start.elapsed(),
            ),
        );
    }
}

pub struct PersistMatchDetailsStep {
    store: Arc<dyn DocumentStore>,
    chunk_size: usize,
}

impl PersistMatchDetailsStep {
    pub fn new(store: Arc<dyn DocumentStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }
}

impl Step<FetchMatchDetailsContext> for PersistMatchDetailsStep {
    fn name(&self) -> &'static str {
        "PersistMatchDetailsStep"
    }

    fn execute(&self, ctx: &mut FetchMatchDetailsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());
        persist_chunked(
            self.name(),
            self.store.as_ref(),
            DocumentKind::MatchDetail,
            ctx.validated_match_details.values(),
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
    use crate::domain::{MatchMetadata, Region};
    use crate::pipeline::{NoopSink, RunControl, StepStatus};
    use crate::steps::testing::{ScriptedApi, SlowSink};
    use serde_json::json;
    use std::time::Duration;

    fn detail(match_id: Option<&str>) -> MatchDetail {
        MatchDetail {
            id: None,
            metadata: Some(MatchMetadata {
                match_id: match_id.map(str::to_string),
                participants: Vec::new(),
            }),
            info: None,
        }
    }

    #[test]
    fn test_load_player_matches_dedupes_and_drops_malformed() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        for (puuid, ids) in [("a", json!(["EUW1_1", "EUW1_2"])), ("b", json!(["EUW1_2", "garbage"]))] {
            store.insert(
                "playermatches",
                json!({ "_id": format!("playerMatches:EUROPE:{}", puuid), "puuid": puuid, "region": "EUROPE", "matchIds": ids }),
            );
        }
        store.insert(
            "playermatches",
            json!({ "_id": "playerMatches:ASIA:z", "puuid": "z", "region": "ASIA", "matchIds": ["KR_9"] }),
        );
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);

        LoadPlayerMatchesStep::new(store).execute(&mut ctx, &scope);

        assert_eq!(ctx.match_ids, vec!["EUW1_1", "EUW1_2"]);
        let logs = ctx.logs.get("LoadPlayerMatchesStep").unwrap();
        assert_eq!(
            logs[0].message,
            "Loaded 2 match ids from 2 player match lists (dropped 1 malformed ids)"
        );
    }

    #[test]
    fn test_pull_match_details() {
        let api = Arc::new(
            ScriptedApi::new()
                .ok("/lol/match/v5/matches/EUW1_1", json!({ "metadata": { "matchId": "EUW1_1" } }))
                .ok("/lol/match/v5/matches/EUW1_2", json!("nope"))
                .fail("/lol/match/v5/matches/EUW1_3", 429),
        );
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        ctx.match_ids = vec!["EUW1_1".into(), "EUW1_2".into(), "EUW1_3".into()];

        PullMatchDetailsStep::new(api.clone()).execute(&mut ctx, &scope);

        let logs = ctx.logs.get("PullMatchDetailsStep").unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs.iter().filter(|l| l.status == StepStatus::Failed).count(), 2);
        assert_eq!(ctx.fetched_match_details.len(), 1);
        assert!(api.calls().iter().all(|(_, route)| route == "EUROPE"));
    }

    #[test]
    fn test_pull_rejects_details_for_another_match() {
        let api = Arc::new(
            ScriptedApi::new()
                .ok("/lol/match/v5/matches/EUW1_1", json!({ "metadata": { "matchId": "EUW1_2" } }))
                .ok("/lol/match/v5/matches/EUW1_2", json!({ "metadata": { "matchId": "EUW1_2" } }))
                .ok("/lol/match/v5/matches/EUW1_3", json!({ "info": { "participants": [] } })),
        );
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        ctx.match_ids = vec!["EUW1_1".into(), "EUW1_2".into(), "EUW1_3".into()];

        PullMatchDetailsStep::new(api).execute(&mut ctx, &scope);

        let logs = ctx.logs.get("PullMatchDetailsStep").unwrap();
        assert_eq!(logs[0].status, StepStatus::Failed);
        assert_eq!(
            logs[0].message,
            "Failed to fetch match details for match: EUW1_1 - malformed response: match details id EUW1_2 does not match requested match"
        );
        assert!(logs[1].is_successful());
        // A body without an id is left for validation to reject.
        assert!(logs[2].is_successful());
        assert_eq!(ctx.fetched_match_details.len(), 2);

        ValidateMatchDetailsStep.execute(&mut ctx, &scope);

        assert_eq!(
            ctx.validated_match_details.keys().collect::<Vec<_>>(),
            vec!["matchDetail:EUROPE:EUW1_2"]
        );
        let summary = ctx.logs.get("ValidateMatchDetailsStep").unwrap().last().unwrap();
        assert_eq!(summary.message, "Validated count: 1 skipped: 1");
    }

    #[test]
    fn test_validate_counts_repeated_ids_once() {
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        ctx.fetched_match_details = vec![detail(Some("EUW1_1")), detail(Some("EUW1_1")), detail(Some("EUW1_2"))];

        ValidateMatchDetailsStep.execute(&mut ctx, &scope);

        assert_eq!(ctx.validated_match_details.len(), 2);
        let logs = ctx.logs.get("ValidateMatchDetailsStep").unwrap();
        assert_eq!(logs.last().unwrap().message, "Validated count: 2 skipped: 0");
    }

    #[test]
    fn test_validate_failures_reach_sink_with_own_timing() {
        let sink = SlowSink::new(Duration::from_millis(30));
        let control = RunControl::new();
        let scope = RunScope::new(&control, &sink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        ctx.fetched_match_details = vec![detail(None), detail(None), detail(None), detail(Some("EUW1_1"))];

        ValidateMatchDetailsStep.execute(&mut ctx, &scope);

        let seen = sink.inner.logs();
        let failed: Vec<_> = seen.iter().filter(|l| l.status == StepStatus::Failed).collect();
        assert_eq!(failed.len(), 3);
        assert!(failed.iter().all(|l| l.message == "Invalid match details - missing metadata.matchId"));
        assert!(
            failed.iter().all(|l| l.execution_time_ms < 30),
            "each skipped detail is timed on its own: {:?}",
            failed
        );
        assert_eq!(seen.last().unwrap().message, "Validated count: 1 skipped: 3");
        assert!(seen.last().unwrap().execution_time_ms >= 90);
    }

    #[test]
    fn test_validate_ten_with_two_missing_ids() {
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        for i in 0..10 {
            let id = format!("EUW1_{}", i);
            ctx.fetched_match_details.push(match i {
                3 => detail(None),
                7 => MatchDetail::default(),
                _ => detail(Some(&id)),
            });
        }

        ValidateMatchDetailsStep.execute(&mut ctx, &scope);

        assert_eq!(ctx.validated_match_details.len(), 8);
        assert!(ctx.validated_match_details.contains_key("matchDetail:EUROPE:EUW1_0"));
        assert_eq!(
            ctx.validated_match_details["matchDetail:EUROPE:EUW1_0"].id.as_deref(),
            Some("matchDetail:EUROPE:EUW1_0")
        );

        let logs = ctx.logs.get("ValidateMatchDetailsStep").unwrap();
        let summary = logs.last().unwrap();
        assert_eq!(summary.status, StepStatus::Successful);
        assert_eq!(summary.message, "Validated count: 8 skipped: 2");
        assert_eq!(logs.iter().filter(|l| !l.is_successful()).count(), 2);
        assert_eq!(logs[0].message, "Invalid match details - missing metadata.matchId");
    }

    #[test]
    fn test_validate_empty_batch() {
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);

        ValidateMatchDetailsStep.execute(&mut ctx, &scope);

        let logs = ctx.logs.get("ValidateMatchDetailsStep").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "Validated count: 0 skipped: 0");
    }

    #[test]
    fn test_persist_match_details() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = FetchMatchDetailsContext::new(Region::Europe, 10);
        let mut d = detail(Some("EUW1_1"));
        d.id = Some("matchDetail:EUROPE:EUW1_1".into());
        ctx.validated_match_details.insert("matchDetail:EUROPE:EUW1_1".into(), d);

        PersistMatchDetailsStep::new(store.clone(), 100).execute(&mut ctx, &scope);

        assert!(store.get("matchdetails", "matchDetail:EUROPE:EUW1_1").is_some());
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::client::{read_all_docs, DocumentStore};
use crate::context::BuildChampionAnalyticsContext;
use crate::domain::{ChampionTally, DocumentKind, MatchDetail};
use crate::pipeline::{RunScope, Step, StepLog};

use super::persist_chunked;

/// Reads up to `limit_matches` stored match details.
pub struct LoadMatchDetailsStep {
    store: Arc<dyn DocumentStore>,
}

impl LoadMatchDetailsStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Step<BuildChampionAnalyticsContext> for LoadMatchDetailsStep {
    fn name(&self) -> &'static str {
        "LoadMatchDetailsStep"
    }

    fn execute(&self, ctx: &mut BuildChampionAnalyticsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let limit = ctx.limit_matches();
        let (outcome, elapsed) = scope.run_one(|| {
            read_all_docs::<MatchDetail>(
                self.store.as_ref(),
                DocumentKind::MatchDetail,
                Some(limit),
                scope.control(),
            )
        });

        let log = match outcome {
            Ok(stored) => {
                let message = format!(
                    "Loaded {} match details (skipped {} unreadable documents)",
                    stored.docs.len(),
                    stored.skipped
                );
                ctx.matches.extend(stored.docs);
                StepLog::successful(self.name(), message, elapsed)
            }
            Err(e) => StepLog::failed(
                self.name(),
                format!("Failed to load match details - {}", e),
                elapsed,
            ),
        };
        scope.record(&mut ctx.logs, log);
    }
}

/// Folds the loaded matches into per-champion statistics in one pass.
///
/// A match with no id, no participants, or a participant without a champion
/// name is logged as FAILED and left out of every tally, including the
/// analysed-match count used for pick rates.
pub struct AggregateChampionStatsStep;

impl AggregateChampionStatsStep {
    fn rejection(detail: &MatchDetail) -> Option<&'static str> {
        if detail.match_id().is_none() {
            return Some("missing metadata.matchId");
        }
        let participants = detail.participants();
        if participants.is_empty() {
            return Some("no participants");
        }
        if participants.iter().any(|p| p.champion_name.as_deref().unwrap_or_default().is_empty()) {
            return Some("participant without championName");
        }
        None
    }
}

impl Step<BuildChampionAnalyticsContext> for AggregateChampionStatsStep {
    fn name(&self) -> &'static str {
        "AggregateChampionStatsStep"
    }

    fn execute(&self, ctx: &mut BuildChampionAnalyticsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let start = Instant::now();
        let mut tallies: BTreeMap<String, ChampionTally> = BTreeMap::new();
        let mut analysed: u32 = 0;
        let mut skipped = 0;

        for detail in &ctx.matches {
            let item_start = Instant::now();
            if let Some(reason) = Self::rejection(detail) {
                let label = detail.match_id().or(detail.id.as_deref()).unwrap_or("<unknown>");
                scope.record(
                    &mut ctx.logs,
                    StepLog::failed(
                        self.name(),
                        format!("Skipping match {} - {}", label, reason),
                        item_start.elapsed(),
                    ),
                );
                skipped += 1;
                continue;
            }

            analysed += 1;
            for participant in detail.participants() {
                let name = participant.champion_name.clone().unwrap_or_default();
                tallies.entry(name).or_default().add(participant);
            }
        }

        for (name, tally) in &tallies {
            let analytics = tally.finish(name, analysed);
            ctx.champion_analytics.insert(analytics.id.clone(), analytics);
        }

        scope.record(
            &mut ctx.logs,
            StepLog::successful(
                self.name(),
                format!(
                    "Aggregated {} champions from {} matches (skipped {})",
                    tallies.len(),
                    analysed,
                    skipped
                ),
                start.elapsed(),
            ),
        );
    }
}

pub struct PersistChampionAnalyticsStep {
    store: Arc<dyn DocumentStore>,
    chunk_size: usize,
}

impl PersistChampionAnalyticsStep {
    pub fn new(store: Arc<dyn DocumentStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }
}

impl Step<BuildChampionAnalyticsContext> for PersistChampionAnalyticsStep {
    fn name(&self) -> &'static str {
        "PersistChampionAnalyticsStep"
    }

    fn execute(&self, ctx: &mut BuildChampionAnalyticsContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());
        persist_chunked(
            self.name(),
            self.store.as_ref(),
            DocumentKind::ChampionDetails,
            ctx.champion_analytics.values(),
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
    use crate::pipeline::{NoopSink, RunControl, StepStatus};
    use crate::steps::testing::SlowSink;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn match_json(id: &str, picks: &[(&str, bool, u32, u32, u32)]) -> Value {
        let participants: Vec<Value> = picks
            .iter()
            .map(|(champ, win, k, d, a)| {
                json!({ "championName": champ, "win": win, "kills": k, "deaths": d, "assists": a })
            })
            .collect();
        json!({
            "_id": format!("matchDetail:EUROPE:{}", id),
            "metadata": { "matchId": id },
            "info": { "participants": participants }
        })
    }

    #[test]
    fn test_load_match_details_respects_limit() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        for i in 0..5 {
            store.insert("matchdetails", match_json(&format!("EUW1_{}", i), &[("Ahri", true, 1, 1, 1)]));
        }
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = BuildChampionAnalyticsContext::new(3);

        LoadMatchDetailsStep::new(store).execute(&mut ctx, &scope);

        assert_eq!(ctx.matches.len(), 3);
        assert_eq!(ctx.logs.get("LoadMatchDetailsStep").unwrap().len(), 1);
    }

    #[test]
    fn test_aggregate_champion_stats() {
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);
        let mut ctx = BuildChampionAnalyticsContext::new(10);
        for value in [
            match_json("EUW1_1", &[("Ahri", true, 5, 1, 3), ("Lux", false, 1, 5, 2)]),
            match_json("EUW1_2", &[("Ahri", false, 2, 3, 4), ("Garen", true, 7, 2, 1)]),
            json!({ "metadata": { "matchId": "EUW1_3" }, "info": { "participants": [] } }),
            json!({ "info": { "participants": [{ "championName": "Zed" }] } }),
        ] {
            ctx.matches.push(serde_json::from_value(value).unwrap());
        }

        AggregateChampionStatsStep.execute(&mut ctx, &scope);

        assert_eq!(ctx.champion_analytics.len(), 3);
        let ahri = &ctx.champion_analytics["championDetails:GLOBAL:Ahri"];
        assert_eq!(ahri.games, 2);
        assert_eq!(ahri.wins, 1);
        assert_eq!(ahri.win_rate, 50.0);
        assert_eq!(ahri.pick_rate, 100.0);
        assert_eq!(ahri.matches_analysed, 2);
        assert!(!ctx.champion_analytics.contains_key("championDetails:GLOBAL:Zed"));

        let logs = ctx.logs.get("AggregateChampionStatsStep").unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs.iter().filter(|l| l.status == StepStatus::Failed).count(), 2);
        assert_eq!(
            logs.last().unwrap().message,
            "Aggregated 3 champions from 2 matches (skipped 2)"
        );
    }

    #[test]
    fn test_skipped_matches_are_timed_individually() {
        let sink = SlowSink::new(Duration::from_millis(30));
        let control = RunControl::new();
        let scope = RunScope::new(&control, &sink);
        let mut ctx = BuildChampionAnalyticsContext::new(10);
        for i in 0..3 {
            let value = json!({ "metadata": { "matchId": format!("EUW1_{}", i) }, "info": { "participants": [] } });
            ctx.matches.push(serde_json::from_value(value).unwrap());
        }

        AggregateChampionStatsStep.execute(&mut ctx, &scope);

        let seen = sink.inner.logs();
        assert_eq!(seen.len(), 4);
        assert!(seen[..3].iter().all(|l| l.status == StepStatus::Failed && l.execution_time_ms < 30));
        assert_eq!(seen[2].message, "Skipping match EUW1_2 - no participants");
    }

    #[test]
    fn test_persist_champion_analytics_is_idempotent() {
        let store = Arc::new(MemoryStore::with_pipeline_databases());
        let control = RunControl::new();
        let scope = RunScope::new(&control, &NoopSink);

        for _ in 0..2 {
            let mut ctx = BuildChampionAnalyticsContext::new(10);
            ctx.matches
                .push(serde_json::from_value(match_json("EUW1_1", &[("Ahri", true, 1, 0, 1)])).unwrap());
            AggregateChampionStatsStep.execute(&mut ctx, &scope);
            PersistChampionAnalyticsStep::new(store.clone(), 50).execute(&mut ctx, &scope);
        }

        assert_eq!(store.ids("championdetails"), vec!["championDetails:GLOBAL:Ahri".to_string()]);
    }
}

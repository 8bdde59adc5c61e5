//! The four pipelines, each a fixed step sequence over its own context.

use std::sync::Arc;

use crate::client::{DocumentStore, StatsApi};
use crate::config::PipelineSettings;
use crate::context::{
    BuildChampionAnalyticsContext, FetchMatchDetailsContext, FetchMatchesContext, FetchPlayersContext,
};
use crate::pipeline::Director;
use crate::steps::{
    AggregateChampionStatsStep, FilterExistingPlayersStep, LoadMatchDetailsStep, LoadPlayerMatchesStep,
    LoadPlayersStep, PersistChampionAnalyticsStep, PersistMatchDetailsStep, PersistPlayerMatchesStep,
    PersistPlayersStep, PullLeagueEntriesStep, PullMatchDetailsStep, PullMatchesFromRiotStep,
    ResolvePlayerAccountsStep, ValidateMatchDetailsStep,
};

pub fn fetch_players(
    api: Arc<dyn StatsApi>,
    store: Arc<dyn DocumentStore>,
    settings: &PipelineSettings,
) -> Director<FetchPlayersContext> {
    Director::builder("fetch-players")
        .step(PullLeagueEntriesStep::new(api.clone()))
        .step(ResolvePlayerAccountsStep::new(api))
        .step(FilterExistingPlayersStep::new(store.clone()))
        .step(PersistPlayersStep::new(store, settings.bulk_chunk_size))
        .build()
}

pub fn fetch_matches(
    api: Arc<dyn StatsApi>,
    store: Arc<dyn DocumentStore>,
    settings: &PipelineSettings,
) -> Director<FetchMatchesContext> {
    Director::builder("fetch-matches")
        .step(LoadPlayersStep::new(store.clone()))
        .step(PullMatchesFromRiotStep::new(api, settings.match_ids_per_player))
        .step(PersistPlayerMatchesStep::new(store, settings.bulk_chunk_size))
        .build()
}

pub fn fetch_match_details(
    api: Arc<dyn StatsApi>,
    store: Arc<dyn DocumentStore>,
    settings: &PipelineSettings,
) -> Director<FetchMatchDetailsContext> {
    Director::builder("fetch-match-details")
        .step(LoadPlayerMatchesStep::new(store.clone()))
        .step(PullMatchDetailsStep::new(api))
        .step(ValidateMatchDetailsStep)
        .step(PersistMatchDetailsStep::new(store, settings.bulk_chunk_size))
        .build()
}

pub fn build_champion_analytics(
    store: Arc<dyn DocumentStore>,
    settings: &PipelineSettings,
) -> Director<BuildChampionAnalyticsContext> {
    Director::builder("build-analytics")
        .step(LoadMatchDetailsStep::new(store.clone()))
        .step(AggregateChampionStatsStep)
        .step(PersistChampionAnalyticsStep::new(store, settings.bulk_chunk_size))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStore;
    use crate::steps::testing::ScriptedApi;

    #[test]
    fn test_step_sequences() {
        let api: Arc<dyn StatsApi> = Arc::new(ScriptedApi::new());
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let settings = PipelineSettings::default();

        assert_eq!(
            fetch_players(api.clone(), store.clone(), &settings).step_names(),
            vec![
                "PullLeagueEntriesStep",
                "ResolvePlayerAccountsStep",
                "FilterExistingPlayersStep",
                "PersistPlayersStep"
            ]
        );
        assert_eq!(
            fetch_matches(api.clone(), store.clone(), &settings).step_names(),
            vec!["LoadPlayersStep", "PullMatchesFromRiotStep", "PersistPlayerMatchesStep"]
        );
        assert_eq!(
            fetch_match_details(api, store.clone(), &settings).step_names(),
            vec![
                "LoadPlayerMatchesStep",
                "PullMatchDetailsStep",
                "ValidateMatchDetailsStep",
                "PersistMatchDetailsStep"
            ]
        );
        let analytics = build_champion_analytics(store, &settings);
        assert_eq!(analytics.name(), "build-analytics");
        assert_eq!(analytics.step_count(), 3);
    }
}

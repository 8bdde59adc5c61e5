use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::client::{read_all_docs, DocumentStore, StatsApi};
use crate::context::FetchPlayersContext;
use crate::domain::{Account, DocumentKind, LeagueEntry, Player};
use crate::pipeline::{RunScope, Step, StepLog, UnitError};

use super::persist_chunked;

/// Pulls league entries page by page, one request per page.
pub struct PullLeagueEntriesStep {
    api: Arc<dyn StatsApi>,
}

impl PullLeagueEntriesStep {
    pub fn new(api: Arc<dyn StatsApi>) -> Self {
        Self { api }
    }
}

impl Step<FetchPlayersContext> for PullLeagueEntriesStep {
    fn name(&self) -> &'static str {
        "PullLeagueEntriesStep"
    }

    fn execute(&self, ctx: &mut FetchPlayersContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let pages: Vec<u32> = ctx.pages().collect();
        let path_prefix = format!(
            "/lol/league/v4/entries/{}/{}/{}",
            ctx.queue().api_name(),
            ctx.tier(),
            ctx.division()
        );
        let platform = ctx.region().platform();

        let results = scope.run_units(pages, |page| {
            let path = format!("{}?page={}", path_prefix, page);
            let body = self
                .api
                .send_request(&path, platform, scope.control())
                .into_api_body()?;
            serde_json::from_value::<Vec<LeagueEntry>>(body)
                .map_err(|e| UnitError::Malformed(format!("league entries: {}", e)))
        });

        for result in results {
            let log = match result.outcome {
                Ok(entries) => {
                    let fetched = entries.len();
                    let mut added = 0;
                    for entry in entries {
                        if !ctx.league_entries.iter().any(|e| e.puuid == entry.puuid) {
                            ctx.league_entries.push(entry);
                            added += 1;
                        }
                    }
                    StepLog::successful(
                        self.name(),
                        format!(
                            "Fetched {} league entries from page {} ({} new)",
                            fetched, result.unit, added
                        ),
                        result.elapsed,
                    )
                }
                Err(e) => StepLog::failed(
                    self.name(),
                    format!("Failed to fetch league entries page {} - {}", result.unit, e),
                    result.elapsed,
                ),
            };
            scope.record(&mut ctx.logs, log);
        }
    }
}

/// Resolves every league entry to an account, one request per puuid.
pub struct ResolvePlayerAccountsStep {
    api: Arc<dyn StatsApi>,
}

impl ResolvePlayerAccountsStep {
    pub fn new(api: Arc<dyn StatsApi>) -> Self {
        Self { api }
    }
}

impl Step<FetchPlayersContext> for ResolvePlayerAccountsStep {
    fn name(&self) -> &'static str {
        "ResolvePlayerAccountsStep"
    }

    fn execute(&self, ctx: &mut FetchPlayersContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let entries = ctx.league_entries.clone();
        let region = ctx.region();

        let results = scope.run_units(entries, |entry| {
            let path = format!("/riot/account/v1/accounts/by-puuid/{}", entry.puuid);
            let body = self
                .api
                .send_request(&path, region.as_str(), scope.control())
                .into_api_body()?;
            let account: Account = serde_json::from_value(body)
                .map_err(|e| UnitError::Malformed(format!("account: {}", e)))?;
            if account.puuid != entry.puuid {
                return Err(UnitError::Malformed(format!(
                    "account puuid {} does not match requested puuid",
                    account.puuid
                )));
            }
            Ok(account)
        });

        for result in results {
            let puuid = &result.unit.puuid;
            let log = match result.outcome {
                Ok(account) => {
                    let message = format!(
                        "Resolved account {}#{} for puuid: {}",
                        account.game_name.as_deref().unwrap_or("?"),
                        account.tag_line.as_deref().unwrap_or("?"),
                        puuid
                    );
                    let player = Player::from_entry(
                        &result.unit,
                        account,
                        ctx.region(),
                        ctx.tier(),
                        ctx.division(),
                        ctx.queue(),
                    );
                    ctx.players.insert(player.id.clone(), player);
                    StepLog::successful(self.name(), message, result.elapsed)
                }
                Err(e) => StepLog::failed(
                    self.name(),
                    format!("Failed to resolve account for puuid: {} - {}", puuid, e),
                    result.elapsed,
                ),
            };
            scope.record(&mut ctx.logs, log);
        }
    }
}

#[derive(Deserialize)]
struct DocumentId {
    #[serde(rename = "_id")]
    id: String,
}

/// Splits resolved players into already-stored and new ones with a single
/// read of the players database.
///
/// When the read fails every resolved player is treated as new; persisting
/// is idempotent by synthetic id, so this only costs extra writes.
pub struct FilterExistingPlayersStep {
    store: Arc<dyn DocumentStore>,
}

impl FilterExistingPlayersStep {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl Step<FetchPlayersContext> for FilterExistingPlayersStep {
    fn name(&self) -> &'static str {
        "FilterExistingPlayersStep"
    }

    fn execute(&self, ctx: &mut FetchPlayersContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let (outcome, elapsed) = scope.run_one(|| {
            read_all_docs::<DocumentId>(self.store.as_ref(), DocumentKind::Player, None, scope.control())
        });

        let log = match outcome {
            Ok(stored) => {
                let stored_ids: BTreeSet<String> = stored.docs.into_iter().map(|d| d.id).collect();
                for id in ctx.players.keys() {
                    if stored_ids.contains(id) {
                        ctx.existing_player_ids.insert(id.clone());
                    } else {
                        ctx.new_player_ids.insert(id.clone());
                    }
                }
                StepLog::successful(
                    self.name(),
                    format!(
                        "Found {} existing players, {} new",
                        ctx.existing_player_ids.len(),
                        ctx.new_player_ids.len()
                    ),
                    elapsed,
                )
            }
            Err(e) => {
                ctx.new_player_ids.extend(ctx.players.keys().cloned());
                StepLog::failed(
                    self.name(),
                    format!(
                        "Could not read existing players, treating {} as new - {}",
                        ctx.new_player_ids.len(),
                        e
                    ),
                    elapsed,
                )
            }
        };
        scope.record(&mut ctx.logs, log);
    }
}

/// Bulk-writes the new players.
pub struct PersistPlayersStep {
    store: Arc<dyn DocumentStore>,
    chunk_size: usize,
}

impl PersistPlayersStep {
    pub fn new(store: Arc<dyn DocumentStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }
}

impl Step<FetchPlayersContext> for PersistPlayersStep {
    fn name(&self) -> &'static str {
        "PersistPlayersStep"
    }

    fn execute(&self, ctx: &mut FetchPlayersContext, scope: &RunScope<'_>) {
        ctx.logs.open(self.name());

        let new_players: Vec<&Player> = ctx
            .new_player_ids
            .iter()
            .filter_map(|id| ctx.players.get(id))
            .collect();

        persist_chunked::<Player, _>(
            self.name(),
            self.store.as_ref(),
            DocumentKind::Player,
            new_players,
            self.chunk_size,
            &mut ctx.logs,
            scope,
        );
    }
}

use serde::{Deserialize, Serialize};

use super::keys::DocumentKind;
use super::region::{Division, Queue, Region, Tier};

/// One row of a league-v4 entries page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub puuid: String,
    #[serde(default)]
    pub summoner_id: Option<String>,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

/// account-v1 lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(rename = "_id")]
    pub id: String,
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
    pub region: Region,
    pub tier: Tier,
    pub division: Division,
    pub queue: Queue,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl Player {
    pub fn from_entry(
        entry: &LeagueEntry,
        account: Account,
        region: Region,
        tier: Tier,
        division: Division,
        queue: Queue,
    ) -> Self {
        Self {
            id: DocumentKind::Player.regional_key(region, &entry.puuid),
            puuid: entry.puuid.clone(),
            game_name: account.game_name,
            tag_line: account.tag_line,
            region,
            tier,
            division,
            queue,
            league_points: entry.league_points,
            wins: entry.wins,
            losses: entry.losses,
        }
    }
}

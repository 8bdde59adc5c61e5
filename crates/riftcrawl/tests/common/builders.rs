//! Builders for Riot API payloads and stored documents.

#![allow(dead_code)]

use serde_json::{json, Value};

pub const LEAGUE_GOLD_II: &str = "/lol/league/v4/entries/RANKED_SOLO_5x5/GOLD/II";

pub fn league_page_path(page: u32) -> String {
    format!("{}?page={}", LEAGUE_GOLD_II, page)
}

pub fn account_path(puuid: &str) -> String {
    format!("/riot/account/v1/accounts/by-puuid/{}", puuid)
}

pub fn match_ids_path(puuid: &str, count: u32) -> String {
    format!(
        "/lol/match/v5/matches/by-puuid/{}/ids?type=ranked&start=0&count={}",
        puuid, count
    )
}

pub fn match_detail_path(match_id: &str) -> String {
    format!("/lol/match/v5/matches/{}", match_id)
}

pub fn league_entry(puuid: &str) -> Value {
    json!({
        "puuid": puuid,
        "leagueId": "league-1",
        "tier": "GOLD",
        "rank": "II",
        "leaguePoints": 42,
        "wins": 10,
        "losses": 8
    })
}

pub fn account(puuid: &str) -> Value {
    json!({ "puuid": puuid, "gameName": format!("name-{}", puuid), "tagLine": "EUW" })
}

pub fn stored_player(puuid: &str) -> Value {
    json!({
        "_id": format!("player:EUROPE:{}", puuid),
        "puuid": puuid,
        "region": "EUROPE",
        "tier": "GOLD",
        "division": "II",
        "queue": "RANKED_SOLO"
    })
}

/// Builder for match-v5 detail payloads.
pub struct MatchBuilder {
    match_id: Option<String>,
    participants: Vec<Value>,
}

impl MatchBuilder {
    pub fn new(match_id: &str) -> Self {
        Self {
            match_id: Some(match_id.to_string()),
            participants: Vec::new(),
        }
    }

    /// Payload with no `metadata.matchId`.
    pub fn without_id() -> Self {
        Self {
            match_id: None,
            participants: Vec::new(),
        }
    }

    pub fn participant(mut self, champion: &str, win: bool, kills: u32, deaths: u32, assists: u32) -> Self {
        self.participants.push(json!({
            "puuid": format!("p-{}", self.participants.len()),
            "championId": self.participants.len() as i64 + 1,
            "championName": champion,
            "win": win,
            "kills": kills,
            "deaths": deaths,
            "assists": assists
        }));
        self
    }

    pub fn build(self) -> Value {
        let metadata = match self.match_id {
            Some(id) => json!({ "matchId": id, "participants": [] }),
            None => json!({ "participants": [] }),
        };
        json!({
            "metadata": metadata,
            "info": { "gameDuration": 1800, "queueId": 420, "participants": self.participants }
        })
    }
}

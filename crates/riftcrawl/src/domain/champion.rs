use serde::{Deserialize, Serialize};

use super::keys::{DocumentKind, GLOBAL_SCOPE};
use super::matches::MatchParticipant;

/// Aggregated per-champion statistics, persisted once per champion name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionAnalytics {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub champion_id: Option<i64>,
    pub champion_name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage, two decimals.
    pub win_rate: f64,
    /// Percentage of analysed matches the champion appeared in.
    pub pick_rate: f64,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
    pub kda: f64,
    pub matches_analysed: u32,
}

/// Running totals for one champion while folding match participants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChampionTally {
    pub champion_id: Option<i64>,
    pub games: u32,
    pub wins: u32,
    pub kills: u64,
    pub deaths: u64,
    pub assists: u64,
}

impl ChampionTally {
    pub fn add(&mut self, participant: &MatchParticipant) {
        if self.champion_id.is_none() {
            self.champion_id = participant.champion_id;
        }
        self.games += 1;
        if participant.win {
            self.wins += 1;
        }
        self.kills += u64::from(participant.kills);
        self.deaths += u64::from(participant.deaths);
        self.assists += u64::from(participant.assists);
    }

    pub fn finish(&self, champion_name: &str, matches_analysed: u32) -> ChampionAnalytics {
        let games = f64::from(self.games.max(1));
        let pick_rate = if matches_analysed == 0 {
            0.0
        } else {
            round2(f64::from(self.games) / f64::from(matches_analysed) * 100.0)
        };

        ChampionAnalytics {
            id: DocumentKind::ChampionDetails.key(GLOBAL_SCOPE, champion_name),
            champion_id: self.champion_id,
            champion_name: champion_name.to_string(),
            games: self.games,
            wins: self.wins,
            losses: self.games - self.wins,
            win_rate: round2(f64::from(self.wins) / games * 100.0),
            pick_rate,
            avg_kills: round2(self.kills as f64 / games),
            avg_deaths: round2(self.deaths as f64 / games),
            avg_assists: round2(self.assists as f64 / games),
            kda: round2((self.kills + self.assists) as f64 / self.deaths.max(1) as f64),
            matches_analysed,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

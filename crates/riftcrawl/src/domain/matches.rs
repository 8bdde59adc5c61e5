use serde::{Deserialize, Serialize};

use super::keys::DocumentKind;
use super::region::Region;

/// Match ids fetched for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatches {
    #[serde(rename = "_id")]
    pub id: String,
    pub puuid: String,
    pub region: Region,
    #[serde(default)]
    pub match_ids: Vec<String>,
}

impl PlayerMatches {
    pub fn new(region: Region, puuid: &str, match_ids: Vec<String>) -> Self {
        Self {
            id: DocumentKind::PlayerMatches.regional_key(region, puuid),
            puuid: puuid.to_string(),
            region,
            match_ids,
        }
    }
}

/// Subset of a match-v5 match document that the analytics need.
///
/// Every nested field is optional: the API occasionally returns partial
/// documents and those must be rejected by validation, not by parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<MatchMetadata>,
    #[serde(default)]
    pub info: Option<MatchInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default)]
    pub game_duration: i64,
    #[serde(default)]
    pub game_version: Option<String>,
    #[serde(default)]
    pub queue_id: Option<i32>,
    #[serde(default)]
    pub participants: Vec<MatchParticipant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub champion_id: Option<i64>,
    #[serde(default)]
    pub champion_name: Option<String>,
    #[serde(default)]
    pub team_position: Option<String>,
    #[serde(default)]
    pub win: bool,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
}

impl MatchDetail {
    /// `metadata.matchId`, if present and non-empty.
    pub fn match_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.match_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn participants(&self) -> &[MatchParticipant] {
        self.info
            .as_ref()
            .map(|info| info.participants.as_slice())
            .unwrap_or_default()
    }
}

use std::sync::LazyLock;

use regex::Regex;

use super::region::Region;

/// Scope used for documents that aggregate across regions.
pub const GLOBAL_SCOPE: &str = "GLOBAL";

static RE_MATCH_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]+_[0-9]+$").unwrap());

/// Persisted document kinds. Each kind lives in its own database and is keyed
/// `"<kind>:<scope>:<externalId>"` so repeated runs overwrite instead of
/// duplicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Player,
    PlayerMatches,
    MatchDetail,
    ChampionDetails,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Player => "player",
            DocumentKind::PlayerMatches => "playerMatches",
            DocumentKind::MatchDetail => "matchDetail",
            DocumentKind::ChampionDetails => "championDetails",
        }
    }

    pub fn database(&self) -> &'static str {
        match self {
            DocumentKind::Player => "players",
            DocumentKind::PlayerMatches => "playermatches",
            DocumentKind::MatchDetail => "matchdetails",
            DocumentKind::ChampionDetails => "championdetails",
        }
    }

    pub fn key(&self, scope: &str, external_id: &str) -> String {
        format!("{}:{}:{}", self.prefix(), scope, external_id)
    }

    pub fn regional_key(&self, region: Region, external_id: &str) -> String {
        self.key(region.as_str(), external_id)
    }

    /// `/{db}/_all_docs?include_docs=true`, optionally capped at `limit` rows.
    pub fn all_docs_path(&self, limit: Option<usize>) -> String {
        match limit {
            Some(limit) => format!("/{}/_all_docs?include_docs=true&limit={}", self.database(), limit),
            None => format!("/{}/_all_docs?include_docs=true", self.database()),
        }
    }
}

/// Riot match ids look like `EUW1_6912345678`.
pub fn is_valid_match_id(id: &str) -> bool {
    RE_MATCH_ID.is_match(id)
}

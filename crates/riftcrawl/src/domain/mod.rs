//! Entities crawled from the stats API and the documents persisted for them.

pub mod champion;
pub mod keys;
pub mod matches;
pub mod player;
pub mod region;

pub use champion::{ChampionAnalytics, ChampionTally};
pub use keys::{is_valid_match_id, DocumentKind, GLOBAL_SCOPE};
pub use matches::{MatchDetail, MatchInfo, MatchMetadata, MatchParticipant, PlayerMatches};
pub use player::{Account, LeagueEntry, Player};
pub use region::{Division, MatchType, Queue, Region, Tier};

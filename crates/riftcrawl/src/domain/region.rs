use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Riot regional routing value. Match and account endpoints are served per
/// region; league endpoints are served by the region's platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    Europe,
    Americas,
    Asia,
    Sea,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Europe, Region::Americas, Region::Asia, Region::Sea];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Europe => "EUROPE",
            Region::Americas => "AMERICAS",
            Region::Asia => "ASIA",
            Region::Sea => "SEA",
        }
    }

    /// Route tag for the platform that serves league data for this region.
    pub fn platform(&self) -> &'static str {
        match self {
            Region::Europe => "EUW1",
            Region::Americas => "NA1",
            Region::Asia => "KR",
            Region::Sea => "SG2",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown region '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tier '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Division::I),
            "II" | "2" => Ok(Division::II),
            "III" | "3" => Ok(Division::III),
            "IV" | "4" => Ok(Division::IV),
            _ => Err(format!("unknown division '{}'", s)),
        }
    }
}

/// Ranked queue as accepted by request records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Queue {
    RankedSolo,
    RankedFlex,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::RankedSolo => "RANKED_SOLO",
            Queue::RankedFlex => "RANKED_FLEX",
        }
    }

    /// Queue identifier used in league-v4 paths.
    pub fn api_name(&self) -> &'static str {
        match self {
            Queue::RankedSolo => "RANKED_SOLO_5x5",
            Queue::RankedFlex => "RANKED_FLEX_SR",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Queue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RANKED_SOLO" | "RANKED_SOLO_5X5" => Ok(Queue::RankedSolo),
            "RANKED_FLEX" | "RANKED_FLEX_SR" => Ok(Queue::RankedFlex),
            _ => Err(format!("unknown queue '{}'", s)),
        }
    }
}

/// Match-v5 `type` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Ranked,
    Normal,
    Tourney,
    Tutorial,
}

impl MatchType {
    pub fn api_name(&self) -> &'static str {
        match self {
            MatchType::Ranked => "ranked",
            MatchType::Normal => "normal",
            MatchType::Tourney => "tourney",
            MatchType::Tutorial => "tutorial",
        }
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ranked" => Ok(MatchType::Ranked),
            "normal" => Ok(MatchType::Normal),
            "tourney" => Ok(MatchType::Tourney),
            "tutorial" => Ok(MatchType::Tutorial),
            _ => Err(format!("unknown match type '{}'", s)),
        }
    }
}

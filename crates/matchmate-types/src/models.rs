use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a profile stands with the user. Stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionStatus {
    #[default]
    Unseen,
    Accepted,
    Declined,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "UNSEEN",
            Self::Accepted => "ACCEPTED",
            Self::Declined => "DECLINED",
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Unseen)
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNSEEN" => Ok(Self::Unseen),
            "ACCEPTED" => Ok(Self::Accepted),
            "DECLINED" => Ok(Self::Declined),
            other => Err(format!("unknown interaction status '{}'", other)),
        }
    }
}

/// A user's choice on a card. Only decided states can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

impl From<Decision> for InteractionStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => Self::Accepted,
            Decision::Decline => Self::Declined,
        }
    }
}

/// A profile in the active feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub cell: String,
    pub picture_large: String,
    pub picture_medium: String,
    pub picture_thumbnail: String,
    pub interaction_status: InteractionStatus,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Snapshot of a profile taken when the user decided on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryProfile {
    pub profile: Profile,
    pub decided_at: DateTime<Utc>,
}

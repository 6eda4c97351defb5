//! Tournament join entries (players registered for a TDM match).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device the player joins from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Android,
    Ios,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Android => write!(f, "android"),
            Device::Ios => write!(f, "ios"),
        }
    }
}

impl Device {
    /// Parse the stored text form; `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "android" => Some(Device::Android),
            "ios" => Some(Device::Ios),
            _ => None,
        }
    }
}

/// Review state of a join entry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl std::fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStatus::Pending => write!(f, "pending"),
            JoinStatus::Confirmed => write!(f, "confirmed"),
            JoinStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl JoinStatus {
    /// Parse the stored text form; `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JoinStatus::Pending),
            "confirmed" => Some(JoinStatus::Confirmed),
            "rejected" => Some(JoinStatus::Rejected),
            _ => None,
        }
    }
}

/// A player's registration for a tournament slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentJoin {
    pub id: i64,
    pub player_name: String,
    /// In-game BGMI id.
    pub game_id: String,
    pub device: Device,
    /// Slot / match code, e.g. `TDM-01`.
    pub slot: String,
    pub status: JoinStatus,
    pub joined_at: DateTime<Utc>,
}

//! Deposit requests awaiting admin approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of a deposit request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositStatus::Pending => write!(f, "pending"),
            DepositStatus::Approved => write!(f, "approved"),
            DepositStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl DepositStatus {
    /// Parse the stored text form; `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DepositStatus::Pending),
            "approved" => Some(DepositStatus::Approved),
            "rejected" => Some(DepositStatus::Rejected),
            _ => None,
        }
    }
}

/// A player's deposit request (UTR-verified bank transfer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: i64,
    pub user_name: String,
    pub profile_id: String,
    pub email: String,
    /// Whole rupees.
    pub amount: i64,
    /// Bank transaction reference supplied by the player.
    pub utr: String,
    pub status: DepositStatus,
    pub created_at: DateTime<Utc>,
}

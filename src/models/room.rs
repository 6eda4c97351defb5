//! Custom room credentials published by admins.

use serde::{Deserialize, Serialize};

/// A custom room for a scheduled match (id + password shown to players).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    /// In-game custom room id.
    pub room_id: String,
    pub password: String,
    /// e.g. "1v1 TDM", "Custom Classic", "Squad Scrims".
    pub match_type: String,
    /// e.g. "Warehouse", "Erangel".
    pub map: String,
    /// Scheduled start, stored verbatim as supplied by the console.
    pub starts_at: String,
}

//! User and Otp records for signup and login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Generated display identifier, e.g. `BGMI-482913`.
    pub profile_id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash; never serialized to API responses (see `UserProfile`).
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user (for API responses / admin listing).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub profile_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_user(u: &User) -> Self {
        Self {
            id: u.id,
            profile_id: u.profile_id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            created_at: u.created_at,
        }
    }
}

impl User {
    /// Public profile of this user (for API responses).
    pub fn profile(&self) -> UserProfile {
        UserProfile::from_user(self)
    }
}

/// A one-time signup code issued for an email address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Otp {
    pub id: i64,
    pub email: String,
    /// 6 numeric digits.
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl Otp {
    /// Whether the code's expiry time has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

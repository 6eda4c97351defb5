//! Signed tokens for admin and player sessions (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role carried inside a token.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Player,
}

/// JWT claims: subject email, role, issue and expiry times (unix seconds).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Admin sessions last 12 hours.
fn admin_ttl() -> Duration {
    Duration::hours(12)
}

/// Player sessions last 7 days.
fn player_ttl() -> Duration {
    Duration::days(7)
}

fn sign(secret: &str, sub: &str, role: Role, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Issue an admin token for the given email.
pub fn sign_admin_token(secret: &str, email: &str) -> Result<String> {
    sign(secret, email, Role::Admin, admin_ttl())
}

/// Issue a player token for the given email.
pub fn sign_player_token(secret: &str, email: &str) -> Result<String> {
    sign(secret, email, Role::Player, player_ttl())
}

/// Decode and validate a token (signature + expiry). Returns its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

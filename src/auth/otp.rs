//! OTP and profile-id generation.

use chrono::Duration;
use rand::Rng;

/// How long an issued OTP stays valid.
pub fn otp_ttl() -> Duration {
    Duration::minutes(5)
}

/// Generate a 6-digit one-time code (100000..=999999, so no leading zero).
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..1_000_000u32).to_string()
}

/// Generate a display profile id, e.g. `BGMI-482913`.
///
/// Uniqueness is enforced by the users table; callers retry on collision.
pub fn generate_profile_id() -> String {
    let mut rng = rand::thread_rng();
    format!("BGMI-{}", rng.gen_range(100_000..1_000_000u32))
}

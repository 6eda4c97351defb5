//! Signup and login flows over the storage layer.

use chrono::Utc;

use crate::auth;
use crate::error::{Error, Result};
use crate::models::{Otp, User};
use crate::storage::Storage;

/// Issue a signup OTP for an email address.
///
/// Generates a 6-digit code and stores it with a 5-minute expiry. Delivery
/// is the caller's concern (the server logs the code and echoes it in a dev
/// field).
pub fn request_otp(storage: &Storage, email: &str) -> Result<Otp> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::validation("Email required"));
    }
    let code = auth::generate_otp();
    let expires_at = Utc::now() + auth::otp_ttl();
    storage.create_otp(email, &code, expires_at)
}

/// Complete signup: consume a valid OTP and create the user.
///
/// The most recently issued unused OTP for (email, code) is checked for
/// expiry, then marked used. The email is checked for an existing account
/// before the OTP is consumed, so a rejected registration can retry with the
/// same code.
pub fn register_with_otp(
    storage: &Storage,
    email: &str,
    code: &str,
    name: &str,
    password: &str,
) -> Result<User> {
    let email = email.trim();
    let code = code.trim();
    let name = name.trim();
    if email.is_empty() || code.is_empty() || name.is_empty() || password.is_empty() {
        return Err(Error::validation("email, code, name, password required"));
    }

    if storage.find_user_by_email(email)?.is_some() {
        return Err(Error::EmailRegistered(email.to_string()));
    }

    let otp = storage.latest_otp(email, code)?.ok_or(Error::InvalidOtp)?;
    if otp.is_expired(Utc::now()) {
        return Err(Error::OtpExpired);
    }
    storage.mark_otp_used(otp.id)?;

    let hash = auth::hash_password(password)?;
    storage.create_user(name, email, &hash)
}

/// Log a player in. Unknown email and wrong password both return
/// `Error::InvalidCredentials` (no account probing).
pub fn login(storage: &Storage, email: &str, password: &str) -> Result<User> {
    let user = storage
        .find_user_by_email(email.trim())?
        .ok_or(Error::InvalidCredentials)?;
    if !auth::verify_password(password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }
    Ok(user)
}

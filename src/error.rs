//! Error types for the tournament API.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No matching OTP was found for the given email and code.
    #[error("invalid OTP")]
    InvalidOtp,

    /// The OTP exists but its expiry time has passed.
    #[error("OTP expired")]
    OtpExpired,

    /// A user with this email already exists.
    #[error("email already registered: {0}")]
    EmailRegistered(String),

    /// Login failed: unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A referenced record does not exist.
    #[error("{what} not found")]
    NotFound {
        /// What kind of record was looked up (e.g. "user", "deposit").
        what: &'static str,
    },

    /// A state transition was rejected (e.g. re-processing a deposit).
    #[error("{message}")]
    InvalidTransition {
        /// Why the transition was rejected.
        message: String,
    },

    /// Request payload failed validation.
    #[error("{message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Password hashing or verification failed.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token signing or verification failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// A specialized Result type for API operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given record kind.
    #[must_use]
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    /// Create an invalid-transition error.
    #[must_use]
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(Error::InvalidOtp.to_string(), "invalid OTP");
        assert_eq!(Error::OtpExpired.to_string(), "OTP expired");
        assert_eq!(
            Error::EmailRegistered("a@b.com".into()).to_string(),
            "email already registered: a@b.com"
        );
        assert_eq!(Error::not_found("deposit").to_string(), "deposit not found");
    }

    #[test]
    fn validation_helper() {
        let err = Error::validation("amount must be positive");
        assert_eq!(err.to_string(), "amount must be positive");
    }
}

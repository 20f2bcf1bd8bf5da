//! Authentication logic.
//!
//! Provides password hashing, session token issuance and verification, the
//! account repository, and the account-flag login policy.

pub mod jwt;
pub mod password;
pub mod policy;
pub mod queries;

use std::time::Duration;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("user exists")]
    AccountExists,

    #[error("user not found")]
    AccountNotFound,

    #[error("password not match")]
    AuthenticationFailed,

    #[error("account is disabled or not activated")]
    AccountInactive,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Database error: {0}")]
    Repository(#[from] queries::RepositoryError),

    #[error("Session cache write failed: {0}")]
    CacheWrite(#[from] crate::session::SessionError),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AuthError {
    /// Whether this error is an infrastructure failure whose detail must
    /// stay out of client responses.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Hashing(_)
                | AuthError::Signing(_)
                | AuthError::Repository(_)
                | AuthError::CacheWrite(_)
                | AuthError::Timeout(_)
        )
    }
}

//! Authentication domain models.
//!
//! These are internal domain models, distinct from the HTTP payloads in
//! `gridpulse_api::models` (which use camelCase field names).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::IssuedToken;

/// Authentication method recorded for password accounts.
pub const AUTH_METHOD_BASE: &str = "base";

/// Default role granted on registration.
pub const ROLE_USER: &str = "user";

/// Stored account record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[sqlx(rename = "registration_date")]
    pub registered_at: DateTime<Utc>,
    #[sqlx(rename = "edit_date")]
    pub edited_at: DateTime<Utc>,
    #[sqlx(rename = "password_hashed")]
    pub password_hash: Option<String>,
    pub enabled: Option<bool>,
    pub activated: Option<bool>,
}

/// Fields required to insert an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub auth_method: String,
    pub role: String,
}

impl NewAccount {
    /// A password account with the default method and role.
    pub fn with_defaults(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            auth_method: AUTH_METHOD_BASE.to_string(),
            role: ROLE_USER.to_string(),
        }
    }
}

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account username.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Random token identifier.
    pub jti: Uuid,
}

impl TokenClaims {
    /// Signed lifetime (`exp - iat`); zero if the claims are inverted.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.exp - self.iat).unwrap_or(0))
    }
}

/// Access + refresh tokens issued together.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_defaults() {
        let acc = NewAccount::with_defaults("alice", "a@x.com", "hash".into());
        assert_eq!(acc.auth_method, "base");
        assert_eq!(acc.role, "user");
    }

    #[test]
    fn inverted_claims_have_zero_lifetime() {
        let claims = TokenClaims {
            sub: "a".into(),
            iat: 100,
            exp: 50,
            jti: Uuid::new_v4(),
        };
        assert_eq!(claims.lifetime(), Duration::ZERO);
    }
}

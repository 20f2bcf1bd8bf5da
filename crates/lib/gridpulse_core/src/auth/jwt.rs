//! JWT session token issuance and verification.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenPair};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Refresh token lifetime: 44640 minutes (31 days).
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(44640 * 60);

const _: () = assert!(ACCESS_TOKEN_LIFETIME.as_secs() < REFRESH_TOKEN_LIFETIME.as_secs());

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

impl IssuedToken {
    /// Token lifetime as signed (`exp - iat`).
    pub fn lifetime(&self) -> Duration {
        self.claims.lifetime()
    }
}

/// Signs and verifies HS512 session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from the shared secret. An empty secret is unusable.
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Signing("token secret is empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Sign a token for `subject` valid for `lifetime` from now.
    pub fn issue(&self, subject: &str, lifetime: Duration) -> Result<IssuedToken, AuthError> {
        let lifetime = chrono::Duration::from_std(lifetime)
            .map_err(|e| AuthError::Signing(format!("token lifetime: {e}")))?;
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(format!("jwt encode: {e}")))?;
        Ok(IssuedToken { token, claims })
    }

    /// Issue an access + refresh pair bound to `username`.
    pub fn issue_pair(&self, username: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(username, ACCESS_TOKEN_LIFETIME)?,
            refresh: self.issue(username, REFRESH_TOKEN_LIFETIME)?,
        })
    }

    /// Verify signature and expiry, returning the claims on success.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Verify a token and require it to carry the access lifetime.
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_kind(token, ACCESS_TOKEN_LIFETIME, "access")
    }

    /// Verify a token and require it to carry the refresh lifetime.
    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_kind(token, REFRESH_TOKEN_LIFETIME, "refresh")
    }

    fn verify_kind(
        &self,
        token: &str,
        lifetime: Duration,
        kind: &str,
    ) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.lifetime() != lifetime {
            return Err(AuthError::InvalidToken(format!("expected {kind} token")));
        }
        Ok(claims)
    }
}

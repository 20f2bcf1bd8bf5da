//! Password hashing via bcrypt.

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 14;

/// One-way credential hasher with a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit bcrypt cost (4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with bcrypt. The salt is random per call.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Hashing(format!("bcrypt hash: {e}")))
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A mismatch is `AuthenticationFailed`; a malformed stored hash is a
    /// `Hashing` error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        match bcrypt::verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::AuthenticationFailed),
            Err(e) => Err(AuthError::Hashing(format!("bcrypt verify: {e}"))),
        }
    }
}

//! Account lifecycle gating at login.

use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::models::auth::Account;

/// Which account flags must be set for a login or refresh to succeed.
///
/// An unset flag does not satisfy a requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountPolicy {
    /// Flags are not consulted.
    #[default]
    Ignore,
    RequireEnabled,
    RequireEnabledAndActivated,
}

impl AccountPolicy {
    pub fn check(&self, account: &Account) -> Result<(), AuthError> {
        let allowed = match self {
            AccountPolicy::Ignore => true,
            AccountPolicy::RequireEnabled => account.enabled == Some(true),
            AccountPolicy::RequireEnabledAndActivated => {
                account.enabled == Some(true) && account.activated == Some(true)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(AuthError::AccountInactive)
        }
    }
}

impl std::str::FromStr for AccountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(AccountPolicy::Ignore),
            "require_enabled" => Ok(AccountPolicy::RequireEnabled),
            "require_enabled_and_activated" => Ok(AccountPolicy::RequireEnabledAndActivated),
            other => Err(format!("unknown account policy: {other}")),
        }
    }
}

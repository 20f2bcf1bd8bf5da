//! Authentication service: registration, login and refresh flows.

use std::time::Duration;

use gridpulse_core::auth::AuthError;
use gridpulse_core::auth::jwt::ACCESS_TOKEN_LIFETIME;
use gridpulse_core::auth::password::PasswordHasher;
use gridpulse_core::models::auth::{Account, NewAccount, TokenPair};
use gridpulse_core::session::{self, SessionCache};
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppResult;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, UserData};

/// Overall deadline for a login or refresh.
pub const LOGIN_DEADLINE: Duration = Duration::from_secs(10);

/// Deadline for writing tokens to the session cache.
pub const CACHE_WRITE_DEADLINE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Usernames are stored and looked up without surrounding whitespace.
fn normalize_username(username: &str) -> &str {
    username.trim()
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    require_non_empty("username", normalize_username(&req.username))?;
    require_non_empty("password", &req.password)?;
    require_non_empty("email", req.email.trim())?;
    if !req.email.contains('@') {
        return Err(AuthError::Validation("email must contain '@'".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(hasher: PasswordHasher, password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AuthError::Hashing(format!("hash task: {e}")))?
}

async fn verify_password(
    hasher: PasswordHasher,
    password: &str,
    hash: &str,
) -> Result<(), AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(format!("verify task: {e}")))?
}

async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| AuthError::Timeout(deadline))?
}

async fn find_account(state: &AppState, username: &str) -> Result<Account, AuthError> {
    state
        .accounts
        .find_by_username(username)
        .await?
        .ok_or(AuthError::AccountNotFound)
}

/// Best-effort cache write: failures are logged, never returned.
async fn cache_best_effort<F>(account: &Account, write: F)
where
    F: Future<Output = Result<(), session::SessionError>>,
{
    match tokio::time::timeout(CACHE_WRITE_DEADLINE, write).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let e = AuthError::from(e);
            warn!(account_id = %account.id, error = %e, "session cache write failed");
        }
        Err(_) => {
            warn!(
                account_id = %account.id,
                deadline = ?CACHE_WRITE_DEADLINE,
                "session cache write timed out"
            );
        }
    }
}

fn token_response(pair: TokenPair, username: &str, email: &str) -> TokenResponse {
    TokenResponse {
        access_token: pair.access.token,
        refresh_token: pair.refresh.token,
        user: UserData {
            username: username.to_string(),
            email: email.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Register a new account and issue its first token pair.
///
/// The account row is committed before tokens are signed; if signing fails
/// the account exists without tokens and the client must log in.
pub async fn register(state: &AppState, req: &RegisterRequest) -> AppResult<TokenResponse> {
    validate_registration(req)?;
    let username = normalize_username(&req.username);
    let email = req.email.trim();

    if state.accounts.find_by_username(username).await?.is_some() {
        return Err(AuthError::AccountExists.into());
    }
    if !state.accounts.find_by_email(email).await?.is_empty() {
        return Err(AuthError::AccountExists.into());
    }

    let pw_hash = hash_password(state.hasher, &req.password).await?;
    state
        .accounts
        .insert(&NewAccount::with_defaults(username, email, pw_hash))
        .await?;
    info!(username, "account registered");

    let pair = state.tokens.issue_pair(username).inspect_err(|e| {
        warn!(username, error = %e, "account registered without initial tokens");
    })?;

    Ok(token_response(pair, username, email))
}

/// Authenticate with username + password and cache the issued pair.
pub async fn login(state: &AppState, req: &LoginRequest) -> AppResult<TokenResponse> {
    let resp = with_deadline(LOGIN_DEADLINE, async {
        let account = find_account(state, normalize_username(&req.username)).await?;
        let Some(pw_hash) = account.password_hash.as_deref() else {
            return Err(AuthError::AuthenticationFailed);
        };
        verify_password(state.hasher, &req.password, pw_hash).await?;
        state.config.account_policy.check(&account)?;

        let pair = state.tokens.issue_pair(&account.username)?;
        cache_best_effort(
            &account,
            session::store_token_pair(state.sessions.as_ref(), &account.id, &pair),
        )
        .await;

        info!(username = %account.username, "login succeeded");
        Ok(token_response(pair, &account.username, &account.email))
    })
    .await?;
    Ok(resp)
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token itself is returned unchanged.
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<TokenResponse> {
    let claims = state.tokens.verify_refresh(refresh_token)?;
    let resp = with_deadline(LOGIN_DEADLINE, async {
        let account = find_account(state, &claims.sub).await?;
        state.config.account_policy.check(&account)?;

        let access = state.tokens.issue(&account.username, ACCESS_TOKEN_LIFETIME)?;
        cache_best_effort(
            &account,
            state.sessions.set(
                &session::access_token_key(&account.id),
                &access.token,
                access.lifetime(),
            ),
        )
        .await;

        Ok(TokenResponse {
            access_token: access.token,
            refresh_token: refresh_token.to_string(),
            user: UserData {
                username: account.username,
                email: account.email,
            },
        })
    })
    .await?;
    Ok(resp)
}

/// Look up the public data of an authenticated account.
pub async fn current_user(state: &AppState, username: &str) -> AppResult<UserData> {
    let account = with_deadline(LOGIN_DEADLINE, find_account(state, username)).await?;
    Ok(UserData {
        username: account.username,
        email: account.email,
    })
}

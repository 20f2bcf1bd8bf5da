//! Session cache: a best-effort copy of issued tokens in Redis.
//!
//! Entries are keyed by account id and expire together with the token they
//! hold. The cache is never consulted to authorize a request; the token
//! signature is the authority.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::TokenPair;

/// Session cache errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cache pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("cache command error: {0}")]
    Command(#[from] redis::RedisError),

    #[error("invalid ttl {0:?}")]
    InvalidTtl(Duration),
}

/// Key holding the latest access token of an account.
pub fn access_token_key(account_id: &Uuid) -> String {
    format!("accesstoken-{account_id}")
}

/// Key holding the latest refresh token of an account.
pub fn refresh_token_key(account_id: &Uuid) -> String {
    format!("refreshtoken-{account_id}")
}

/// Fast key-value store with per-entry expiry.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError>;
}

/// Write both tokens of a pair, each with TTL equal to its signed lifetime.
pub async fn store_token_pair(
    cache: &dyn SessionCache,
    account_id: &Uuid,
    pair: &TokenPair,
) -> Result<(), SessionError> {
    cache
        .set(
            &access_token_key(account_id),
            &pair.access.token,
            pair.access.lifetime(),
        )
        .await?;
    cache
        .set(
            &refresh_token_key(account_id),
            &pair.refresh.token,
            pair.refresh.lifetime(),
        )
        .await
}

/// `SessionCache` backed by a deadpool Redis pool.
#[derive(Clone)]
pub struct RedisSessionCache {
    pool: Pool,
}

impl RedisSessionCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let seconds = ttl.as_secs();
        if seconds == 0 {
            return Err(SessionError::InvalidTtl(ttl));
        }
        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(key, value, seconds).await?;
        tracing::debug!(key = %key, ttl_secs = seconds, "session cache entry written");
        Ok(())
    }
}

/// Build a Redis pool from a `redis://host:port/db` URL.
pub fn create_pool(url: &str, max_size: usize) -> Result<Pool, deadpool_redis::CreatePoolError> {
    let mut config = deadpool_redis::Config::from_url(url);
    config.pool = Some(deadpool_redis::PoolConfig::new(max_size));
    config.create_pool(Some(deadpool_redis::Runtime::Tokio1))
}

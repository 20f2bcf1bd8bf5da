//! PostgreSQL connection pool construction.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Upper bound on pooled connections.
pub const MAX_CONNECTIONS: u32 = 4;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: MAX_CONNECTIONS,
            min_connections: 0,
            max_lifetime: Duration::from_secs(60 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
            .acquire_timeout(self.acquire_timeout)
    }

    /// Connect and verify one connection.
    pub async fn connect(&self, url: &str) -> Result<PgPool, sqlx::Error> {
        self.options().connect(url).await
    }

    /// Build the pool without connecting; connections open on first use.
    pub fn connect_lazy(&self, url: &str) -> Result<PgPool, sqlx::Error> {
        self.options().connect_lazy(url)
    }
}

/// Build a `postgres://` URL from its parts.
pub fn connection_url(user: &str, password: &str, host: &str, port: u16, dbname: &str) -> String {
    format!("postgres://{user}:{password}@{host}:{port}/{dbname}")
}

//! API server configuration.
//!
//! Settings come from an optional YAML file; the server binary overlays CLI
//! and environment values on top before building [`ApiConfig`].

use std::path::Path;

use gridpulse_core::auth::password::DEFAULT_BCRYPT_COST;
use gridpulse_core::auth::policy::AccountPolicy;
use gridpulse_core::db::connection_url;
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("token secret is not configured")]
    MissingSecret,

    #[error("invalid bcrypt cost {0} (expected 4..=31)")]
    InvalidCost(u32),
}

/// Configuration for the API server. Built once at startup, read-only after.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (`redis://host:port/db`).
    pub redis_url: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// bcrypt cost for new password hashes.
    pub bcrypt_cost: u32,
    /// Account flags required at login.
    pub account_policy: AccountPolicy,
}

impl ApiConfig {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidCost(self.bcrypt_cost));
        }
        Ok(())
    }
}

/// On-disk YAML layout.
///
/// ```yaml
/// redis: { host: localhost, port: 6379, db: 0 }
/// postgres: { host: localhost, port: 5432, dbname: gridpulse, user: gp, password: gp }
/// app: { bind: 0.0.0.0, port: 3000 }
/// jwtsecret: change-me
/// auth: { bcrypt_cost: 14, account_policy: ignore }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub redis: RedisSection,
    pub postgres: PostgresSection,
    pub app: AppSection,
    pub jwtsecret: String,
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSection {
    pub host: String,
    pub port: u16,
    pub db: u32,
}

impl Default for RedisSection {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6379,
            db: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSection {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            dbname: "gridpulse".into(),
            user: "gridpulse".into(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub bind: String,
    pub port: u16,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub bcrypt_cost: u32,
    pub account_policy: AccountPolicy,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            account_policy: AccountPolicy::default(),
        }
    }
}

impl FileConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn database_url(&self) -> String {
        let pg = &self.postgres;
        connection_url(&pg.user, &pg.password, &pg.host, pg.port, &pg.dbname)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis.host, self.redis.port, self.redis.db)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.bind, self.app.port)
    }

    /// Convert into an [`ApiConfig`] without validating it.
    pub fn into_api_config(self) -> ApiConfig {
        ApiConfig {
            bind_addr: self.bind_addr(),
            database_url: self.database_url(),
            redis_url: self.redis_url(),
            jwt_secret: self.jwtsecret,
            bcrypt_cost: self.auth.bcrypt_cost,
            account_policy: self.auth.account_policy,
        }
    }
}

//! Database migration support.
//!
//! Embeds the reversible SQL migrations from `gridpulse_core/migrations/`.

use sqlx::PgPool;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// One embedded migration and whether it has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply all pending migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Revert the most recently applied migration, if any.
pub async fn migrate_down(pool: &PgPool) -> Result<Option<i64>, MigrateError> {
    let mut applied: Vec<i64> = status(pool)
        .await?
        .into_iter()
        .filter(|m| m.applied)
        .map(|m| m.version)
        .collect();
    applied.sort_unstable();
    let Some(latest) = applied.pop() else {
        info!("no applied migrations to revert");
        return Ok(None);
    };
    let target = applied.last().copied().unwrap_or(0);
    MIGRATOR.undo(pool, target).await?;
    info!(version = latest, "reverted migration");
    Ok(Some(latest))
}

/// List embedded migrations with their applied state.
pub async fn status(pool: &PgPool) -> Result<Vec<MigrationStatus>, MigrateError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied = conn.list_applied_migrations().await?;
    Ok(MIGRATOR
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.iter().any(|a| a.version == m.version),
        })
        .collect())
}

//! Dependency liveness probing.
//!
//! A probe pings PostgreSQL and Redis concurrently. Each ping runs in its
//! own task under its own deadline and reports exactly one outcome over a
//! single-slot channel. A supervisor task closes the channels once both
//! pings have finished, and the caller drains both outcomes before
//! aggregating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Deadline applied to each dependency ping.
pub const PROBE_DEADLINE: Duration = Duration::from_secs(10);

/// Status text reported for a healthy dependency.
pub const STATUS_OK: &str = "OK";

/// Failure of a single dependency ping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    #[error("probe cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),

    #[error("probe task aborted before reporting")]
    Aborted,
}

/// A dependency that can be pinged.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self) -> Result<(), ProbeError>;
}

/// Pings PostgreSQL with `SELECT 1`.
#[derive(Clone)]
pub struct PgPinger {
    pool: PgPool,
}

impl PgPinger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Pinger for PgPinger {
    async fn ping(&self) -> Result<(), ProbeError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::Failed(e.to_string()))
    }
}

/// Pings Redis with `PING`.
#[derive(Clone)]
pub struct RedisPinger {
    pool: deadpool_redis::Pool,
}

impl RedisPinger {
    pub fn new(pool: deadpool_redis::Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Pinger for RedisPinger {
    async fn ping(&self) -> Result<(), ProbeError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ProbeError::Failed(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::Failed(e.to_string()))?;
        Ok(())
    }
}

/// Overall liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Ok,
    Unavailable,
}

/// Per-dependency statuses: `"OK"` or the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivenessReport {
    pub postgres: String,
    pub redis: String,
}

impl LivenessReport {
    pub fn liveness(&self) -> Liveness {
        if self.postgres == STATUS_OK && self.redis == STATUS_OK {
            Liveness::Ok
        } else {
            Liveness::Unavailable
        }
    }
}

/// Concurrent prober over the two backing stores.
#[derive(Clone)]
pub struct LivenessProber {
    postgres: Arc<dyn Pinger>,
    redis: Arc<dyn Pinger>,
    deadline: Duration,
}

impl LivenessProber {
    pub fn new(postgres: Arc<dyn Pinger>, redis: Arc<dyn Pinger>) -> Self {
        Self {
            postgres,
            redis,
            deadline: PROBE_DEADLINE,
        }
    }

    /// Override the per-dependency deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Probe both dependencies. Never fails; failures are reported.
    pub async fn probe(&self) -> LivenessReport {
        self.probe_with_cancel(&CancellationToken::new()).await
    }

    /// Probe both dependencies, aborting early if `parent` is cancelled.
    ///
    /// Dropping the returned future cancels both pings.
    pub async fn probe_with_cancel(&self, parent: &CancellationToken) -> LivenessReport {
        let scope = parent.child_token();
        let _guard = scope.clone().drop_guard();

        let (pg_tx, mut pg_rx) = mpsc::channel::<Result<(), ProbeError>>(1);
        let (redis_tx, mut redis_rx) = mpsc::channel::<Result<(), ProbeError>>(1);

        let pg_task = spawn_check(
            "postgres",
            Arc::clone(&self.postgres),
            self.deadline,
            scope.child_token(),
            pg_tx.clone(),
        );
        let redis_task = spawn_check(
            "redis",
            Arc::clone(&self.redis),
            self.deadline,
            scope.child_token(),
            redis_tx.clone(),
        );

        // Supervisor: holds the original senders until both checks finish.
        tokio::spawn(async move {
            let _ = pg_task.await;
            let _ = redis_task.await;
            drop(pg_tx);
            drop(redis_tx);
        });

        let mut postgres = None;
        let mut redis = None;
        while postgres.is_none() || redis.is_none() {
            tokio::select! {
                outcome = pg_rx.recv(), if postgres.is_none() => {
                    postgres = Some(outcome.unwrap_or(Err(ProbeError::Aborted)));
                }
                outcome = redis_rx.recv(), if redis.is_none() => {
                    redis = Some(outcome.unwrap_or(Err(ProbeError::Aborted)));
                }
            }
        }

        LivenessReport {
            postgres: status_text(postgres.unwrap_or(Err(ProbeError::Aborted))),
            redis: status_text(redis.unwrap_or(Err(ProbeError::Aborted))),
        }
    }
}

fn spawn_check(
    name: &'static str,
    pinger: Arc<dyn Pinger>,
    deadline: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<(), ProbeError>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            res = tokio::time::timeout(deadline, pinger.ping()) => match res {
                Ok(res) => res,
                Err(_) => Err(ProbeError::DeadlineExceeded(deadline)),
            },
        };
        if let Err(e) = &outcome {
            warn!(dependency = name, error = %e, "liveness check failed");
        }
        // Single slot, single send: never blocks.
        let _ = tx.send(outcome).await;
    })
}

fn status_text(outcome: Result<(), ProbeError>) -> String {
    match outcome {
        Ok(()) => STATUS_OK.to_string(),
        Err(e) => e.to_string(),
    }
}

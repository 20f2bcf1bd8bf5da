//! GridPulse account service binary.
//!
//! Loads configuration, connects PostgreSQL and Redis, applies migrations
//! and serves the HTTP API until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use gridpulse_api::config::{ApiConfig, FileConfig};
use gridpulse_core::auth::policy::AccountPolicy;
use gridpulse_core::auth::queries::PgAccountRepository;
use gridpulse_core::db::PoolSettings;
use gridpulse_core::health::{LivenessProber, PgPinger, RedisPinger};
use gridpulse_core::session::{self, RedisSessionCache};
use tracing::{info, warn};

/// Migration action to run at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MigrateAction {
    /// Apply pending migrations, then serve.
    Up,
    /// Revert the latest migration and exit.
    Down,
    /// Print migration status and exit.
    Status,
    /// Serve without touching the schema.
    Skip,
}

/// CLI arguments. Values given here override the config file.
#[derive(Parser, Debug)]
#[command(name = "gridpulse_server", about = "GridPulse account service")]
struct Args {
    /// YAML configuration file. Ignored if it does not exist.
    #[arg(long, env = "GRIDPULSE_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Migration action.
    #[arg(long, value_enum, default_value_t = MigrateAction::Up)]
    migrate: MigrateAction,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Token signing secret.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Address to listen on (host:port).
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Account flags required at login.
    #[arg(long, env = "ACCOUNT_POLICY")]
    account_policy: Option<AccountPolicy>,
}

impl Args {
    fn into_config(self, file: FileConfig) -> ApiConfig {
        let mut config = file.into_api_config();
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(url) = self.redis_url {
            config.redis_url = url;
        }
        if let Some(secret) = self.jwt_secret {
            config.jwt_secret = secret;
        }
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(policy) = self.account_policy {
            config.account_policy = policy;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gridpulse_api=debug,gridpulse_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let file = if args.config.exists() {
        info!(path = %args.config.display(), "loading config file");
        FileConfig::load(&args.config)?
    } else {
        warn!(path = %args.config.display(), "config file not found, using defaults");
        FileConfig::default()
    };
    let migrate = args.migrate;
    let config = args.into_config(file);
    config.validate()?;

    info!(
        version = gridpulse_core::version(),
        bind = %config.bind_addr,
        account_policy = ?config.account_policy,
        "starting gridpulse_server"
    );

    let pool = PoolSettings::default().connect(&config.database_url).await?;
    info!("connected to PostgreSQL");

    match migrate {
        MigrateAction::Up => {
            info!("running database migrations");
            gridpulse_core::migrate::migrate(&pool).await?;
        }
        MigrateAction::Down => {
            match gridpulse_core::migrate::migrate_down(&pool).await? {
                Some(version) => info!(version, "migration reverted"),
                None => info!("nothing to revert"),
            }
            return Ok(());
        }
        MigrateAction::Status => {
            for m in gridpulse_core::migrate::status(&pool).await? {
                let state = if m.applied { "applied" } else { "pending" };
                info!(version = m.version, description = %m.description, state, "migration");
            }
            return Ok(());
        }
        MigrateAction::Skip => info!("skipping database migrations"),
    }

    let redis_pool = session::create_pool(&config.redis_url, 16)?;

    let prober = LivenessProber::new(
        Arc::new(PgPinger::new(pool.clone())),
        Arc::new(RedisPinger::new(redis_pool.clone())),
    );
    let state = gridpulse_api::AppState::new(
        config.clone(),
        Arc::new(PgAccountRepository::new(pool.clone())),
        Arc::new(RedisSessionCache::new(redis_pool.clone())),
        prober,
    )?;

    let app = gridpulse_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    pool.close().await;
    redis_pool.close();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

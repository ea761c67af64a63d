use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use edugate_core::config::{DEFAULT_BIND_ADDR, DEFAULT_DB_MAX_CONNECTIONS};
use edugate_core::http::{router, serve, AppState};
use edugate_core::repositories::{
    PostgresAccountRepository, PostgresCatalogRepository, PostgresCodePoolRepository,
    PostgresRedemptionStore,
};
use edugate_core::services::{AccessGate, CodePoolService, EntitlementService, RedemptionService};
use edugate_core::{Database, ServerConfig};

/// How long in-flight requests get to finish after Ctrl-C.
const GRACEFUL_SHUTDOWN: Duration = Duration::from_secs(10);

#[derive(Parser, Debug, Clone)]
#[command(name = "edugate")]
#[command(author, version, about = "EduGate - access codes and paid content gating for students")]
struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "EDUGATE_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Base64 of the 32-byte key that seals bearer tokens
    #[arg(long, env = "EDUGATE_TOKEN_KEY", hide_env_values = true)]
    token_key: String,

    #[arg(long, env = "EDUGATE_DB_MAX_CONNECTIONS", default_value_t = DEFAULT_DB_MAX_CONNECTIONS)]
    db_max_connections: u32,

    /// Bearer token lifetime in days
    #[arg(long, env = "EDUGATE_TOKEN_TTL_DAYS")]
    token_ttl_days: Option<i64>,

    /// Apply pending migrations and exit
    #[arg(long, default_value = "false")]
    migrate_only: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("edugate=info".parse().unwrap_or_default())
        .add_directive("edugate_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e);
    }
    info!("EduGate stopped. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let config = ServerConfig::new(
        &args.bind_addr,
        &args.database_url,
        &args.token_key,
        args.db_max_connections,
        args.token_ttl_days,
    )
    .context("invalid server configuration")?;
    info!("EduGate starting with {:?}", config);

    // 1) Connect and migrate
    let db = Database::new(&config.database_url, config.db_max_connections)
        .await
        .context("connecting to Postgres")?;
    db.migrate().await.context("running migrations")?;
    if args.migrate_only {
        info!("Migrations applied; exiting.");
        return Ok(());
    }

    // 2) Repositories and services
    let pool = db.pool().clone();
    let pool_repo = Arc::new(PostgresCodePoolRepository::new(pool.clone()));
    let account_repo = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let catalog_repo = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let store = Arc::new(PostgresRedemptionStore::new(pool));

    let codes = Arc::new(CodePoolService::new(pool_repo.clone(), catalog_repo.clone()));
    let redemptions = Arc::new(RedemptionService::new(store, pool_repo.clone(), account_repo.clone()));
    let entitlements = Arc::new(EntitlementService::new(pool_repo, account_repo.clone()));
    let gate = Arc::new(AccessGate::new(entitlements, catalog_repo));

    let state = AppState {
        codes,
        redemptions,
        gate,
        accounts: account_repo,
        tokens: config.token_codec(),
    };
    let app = router(state);

    // 3) Ctrl-C drains in-flight requests, then stops the server
    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down HTTP server...");
        shutdown.graceful_shutdown(Some(GRACEFUL_SHUTDOWN));
    });

    serve(config.bind_addr, app, handle).await?;
    Ok(())
}

//! Live poker server using the async actor model.
//!
//! Every table runs as its own actor, created the first time a player
//! references it and shut down once it has sat empty for a while.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use live_poker::{
    SessionDirectory, TableManager, auth::JwtVerifier, table::DefaultProvisioner,
};
use log::info;
use lp_server::{
    api,
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run a live poker WebSocket server

USAGE:
  lp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  JWT_SECRET               Shared secret access tokens are signed with
  JWT_REQUIRE_EXP          Reject tokens without an expiry [default: true]
  TABLE_SMALL_BLIND        Small blind for new tables [default: 50]
  TABLE_MAX_PLAYERS        Seats per table [default: 6]
  METRICS_BIND             Prometheus scrape address (disabled when unset)
  TABLE_*                  Other table defaults, see the config module
";

/// How often closed tables are swept out of the registry.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics exposed on http://{}/metrics", addr);
    }

    let table_manager = TableManager::new(
        config.table_defaults.clone(),
        Arc::new(DefaultProvisioner),
    );
    info!(
        "Tables start with blinds {}/{} and {} seats",
        config.table_defaults.small_blind,
        config.table_defaults.small_blind * 2,
        config.table_defaults.max_players
    );

    let sweeper = table_manager.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sweeper.evict_closed().await;
            if evicted > 0 {
                info!("Evicted {} idle table(s)", evicted);
            }
        }
    });

    let api_state = api::AppState {
        table_manager,
        sessions: SessionDirectory::new(),
        verifier: Arc::new(JwtVerifier::new(
            &config.security.jwt_secret,
            config.security.require_exp,
        )),
    };

    let app = api::create_router(api_state);

    info!("Starting WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at ws://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}

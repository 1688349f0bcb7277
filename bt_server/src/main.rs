//! Multiplayer blackjack server using one async actor per room.
//!
//! Rooms are created on demand over HTTP and played over a WebSocket.
//! Balances and statistics live in memory for the lifetime of the process.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use blackjack_table::{
    auth::SessionManager,
    room::RoomManager,
    stats::InMemoryStatsStore,
    wallet::InMemoryBalanceStore,
};
use bt_server::{api, config::ServerConfig, logging, metrics};
use tracing::{error, info};
use pico_args::Arguments;

const HELP: &str = "\
Run a multiplayer blackjack server

USAGE:
  bt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics    IP:PORT     Prometheus exporter address [default: env METRICS_BIND, disabled when unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               JWT signing secret (required, at least 32 characters)
  ACCESS_TOKEN_HOURS       Access token lifetime in hours
  STARTING_BALANCE         Chips every new player starts with
  ROOM_SEATS               Seats per room
  ROOM_MIN_BET             Minimum main bet
  DISCONNECT_GRACE_MS      How long a disconnected player keeps their seat
  EMPTY_ROOM_TIMEOUT_MS    How long an empty room stays open
  RUST_LOG                 Log filter (e.g. info,blackjack_table=debug)
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    metrics: Option<SocketAddr>,
}

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

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics: pargs.opt_value_from_str("--metrics")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.metrics)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exposed at http://{}/metrics", addr);
    }

    let balances = Arc::new(InMemoryBalanceStore::with_starting_balance(
        config.starting_balance,
    ));
    let stats = Arc::new(InMemoryStatsStore::new());
    let sessions = Arc::new(SessionManager::new(config.security.jwt_secret.clone()));
    let rooms = Arc::new(RoomManager::new(
        config.room_defaults.clone(),
        balances.clone(),
        stats.clone(),
    ));

    info!(
        "Rooms seat {} players with a minimum bet of {}",
        config.room_defaults.num_seats, config.room_defaults.min_bet
    );

    let api_state = api::AppState {
        sessions,
        rooms: rooms.clone(),
        balances,
        stats,
    };
    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    let closed = rooms.close_all().await;
    info!("Closed {} rooms", closed);

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
}

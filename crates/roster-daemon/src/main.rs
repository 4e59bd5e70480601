//! roster-daemon - the roster collection server.
//!
//! Boot order: configuration, logging, database, collection, router,
//! console, listener. Every component is constructed once here and handed
//! down by reference; there is no global mutable state.
//!
//! Exit codes: `0` after a clean shutdown, `1` when the database is not
//! reachable at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roster_daemon::auth::AuthService;
use roster_daemon::collection::PersonList;
use roster_daemon::commands::CommandRegistry;
use roster_daemon::config::{DbConfig, ServerConfig};
use roster_daemon::console;
use roster_daemon::dispatch::Router;
use roster_daemon::server::Server;
use roster_daemon::state::DaemonState;
use roster_daemon::store::PgStore;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// roster daemon - authenticated, persistent person collection over TCP
#[derive(Parser, Debug)]
#[command(name = "roster-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// TCP port to listen on (overrides the `port6` environment variable)
    #[arg(long)]
    port: Option<u16>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(fallback_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut server_config = ServerConfig::from_env();
    if let Some(port) = args.port {
        server_config.port = port;
    }
    let db_config = DbConfig::from_env();

    // Database unavailability at startup is the one fatal condition with
    // its own exit code.
    let store = match boot_store(&db_config).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %format!("{err:#}"), "database unavailable at startup");
            std::process::exit(1);
        }
    };

    match run(server_config, store.clone()).await {
        Ok(()) => {
            store.close().await;
            info!("shutdown complete");
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "server failed");
            store.close().await;
            std::process::exit(1);
        }
    }
}

async fn boot_store(db_config: &DbConfig) -> Result<PgStore> {
    let store = PgStore::connect(db_config)
        .await
        .context("failed to connect to the database")?;
    store
        .ensure_schema()
        .await
        .context("failed to ensure the schema")?;
    Ok(store)
}

async fn run(server_config: ServerConfig, store: PgStore) -> Result<()> {
    let store = Arc::new(store);
    let list = Arc::new(
        PersonList::load(store.clone())
            .await
            .context("failed to load the collection")?,
    );
    info!(persons = list.len().await, "collection ready");

    let auth = AuthService::new(store);
    let router = Arc::new(Router::new(
        CommandRegistry::with_default_commands(),
        auth,
        list,
    ));

    let state = DaemonState::shared();

    // Console and signals both end in the same place: the shutdown flag.
    tokio::spawn(console::run(state.clone()));
    spawn_signal_handlers(state.clone())?;

    let server = Server::bind(&server_config.bind_addr(), router, state.clone())
        .await
        .context("failed to bind the listener")?;
    server.run().await;

    info!(uptime_secs = state.uptime_secs(), "stopped");
    Ok(())
}

fn spawn_signal_handlers(state: roster_daemon::state::SharedState) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
        state.request_shutdown();
    });
    Ok(())
}

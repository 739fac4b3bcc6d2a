//! # homewatchd — homewatch daemon
//!
//! Composition root that wires the event core to its adapters and starts
//! the server.
//!
//! ## Responsibilities
//! - Load configuration (`homewatch.toml`, env vars) and initialise logging
//! - Open the `SQLite` store and run migrations
//! - Build the event bus, broadcast hub, persistence handlers and plugins
//! - Start the runtime (ticker + dispatch loop)
//! - Serve the axum router until SIGINT/SIGTERM, then stop the runtime
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use homewatch_adapter_http_axum::state::AppState;
use homewatch_adapter_simulator::SimulatorPlugin;
use homewatch_adapter_storage_sqlite_sqlx::pool;
use homewatch_app::broadcast_hub::BroadcastHub;
use homewatch_app::dispatcher::Dispatcher;
use homewatch_app::event_bus;
use homewatch_app::handlers::{AlarmHandler, CommandHandler, LogHandler, ValueHandler};
use homewatch_app::plugin::PluginRegistry;
use homewatch_app::runtime::Runtime;
use homewatch_app::snapshots::StoreSnapshots;
use homewatch_app::ticker::Ticker;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Storage
    let database = pool::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .with_context(|| format!("opening database {}", config.database_url()))?;
    let store = Arc::new(database.store());

    // Event core
    let (events, receiver) = event_bus::channel(config.bus.capacity);
    let hub = Arc::new(BroadcastHub::new(Arc::new(StoreSnapshots::new(
        Arc::clone(&store),
    ))));

    let mut plugins = PluginRegistry::new();
    if config.plugins.simulator_enabled {
        plugins.register(Arc::new(SimulatorPlugin::new(events.clone())));
    }
    if plugins.is_empty() {
        tracing::warn!("no plugins enabled");
    } else {
        let names = plugins.names().collect::<Vec<_>>().join(", ");
        tracing::info!(count = plugins.len(), plugins = %names, "plugins enabled");
    }

    let dispatcher = Dispatcher::builder()
        .handler(Arc::new(LogHandler::new(Arc::clone(&store), Arc::clone(&hub))))
        .handler(Arc::new(ValueHandler::new(
            Arc::clone(&store),
            Arc::clone(&hub),
            events.clone(),
        )))
        .handler(Arc::new(AlarmHandler::new(Arc::clone(&store), Arc::clone(&hub))))
        .handler(Arc::new(CommandHandler::new(events.clone())))
        .plugins(plugins)
        .poll_interval(config.bus.poll_interval())
        .drain_grace(config.bus.drain_grace())
        .build();
    let ticker = Ticker::new(config.bus.cycle_interval(), events.clone());
    let runtime = Runtime::start(dispatcher, receiver, ticker, &events);

    // HTTP
    let state = AppState::from_arcs(store, hub, events);
    let app = homewatch_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "homewatchd listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http");

    runtime.shutdown().await;
    served
}

/// Resolve on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown requested");
}

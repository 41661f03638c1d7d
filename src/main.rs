//! Payment Transaction Orchestrator
//!
//! Routes deposits and withdrawals to interchangeable payment gateways,
//! retries flaky backends, and announces every accepted transaction on an
//! event stream guarded by a circuit breaker.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                  PAYMENT ORCHESTRATOR                     │
//!                 │                                                           │
//!   POST /deposit │  ┌────────┐   ┌──────────────┐   ┌──────────────────┐    │
//!   ──────────────┼─▶│  http  │──▶│ orchestrator │──▶│ gateway selector │────┼──▶ Backend
//!   GET /callback │  │ server │   │ state machine│   │  + health probe  │    │
//!                 │  └────────┘   └──────┬───────┘   └──────────────────┘    │
//!                 │                      │                                    │
//!                 │            ┌─────────┴─────────┐                          │
//!                 │            ▼                   ▼                          │
//!                 │     ┌─────────────┐    ┌──────────────┐                   │
//!                 │     │ transaction │    │    events    │───────────────────┼──▶ Event sink
//!                 │     │    store    │    │ + breaker    │                   │
//!                 │     └─────────────┘    └──────────────┘                   │
//!                 │                                                           │
//!                 │  config · observability · resilience · lifecycle          │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use payment_orchestrator::config::{load_config, OrchestratorConfig};
use payment_orchestrator::health::active::HealthMonitor;
use payment_orchestrator::lifecycle::signals::trigger_on_ctrl_c;
use payment_orchestrator::observability::{logging, metrics};
use payment_orchestrator::{Components, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "payment-orchestrator")]
#[command(about = "Payment transaction orchestrator", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => OrchestratorConfig::default(),
    };

    logging::init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "payment-orchestrator starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_attempts = config.retries.max_attempts,
        failure_threshold = config.circuit_breaker.failure_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let components = Components::from_config(&config);
    let shutdown = Shutdown::new();

    let monitor = HealthMonitor::new(
        components.gateways.clone(),
        components.health.clone(),
        config.health_check.clone(),
    );
    let monitor_handle = tokio::spawn(monitor.run(shutdown.subscribe()));

    let cancel = components.cancel.clone();
    let mut cancel_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = cancel_rx.recv().await;
        cancel.cancel();
    });

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { trigger_on_ctrl_c(&signal_shutdown).await });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(
        components.state,
        Duration::from_secs(config.timeouts.request_secs),
    );
    server.run(listener, shutdown.subscribe()).await?;

    if let Err(e) = monitor_handle.await {
        tracing::error!(error = %e, "Health monitor task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

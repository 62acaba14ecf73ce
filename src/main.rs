//! Academic Credential Chain Service
//!
//! Bridges a university's off-chain approval workflow with on-chain
//! credential issuance, and serves public verification lookups.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │               CREDENTIAL SERVICE                  │
//!                         │                                                   │
//!   Admin Request         │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│credentials│───▶│   chain    │──┼──▶ Ledger
//!   (bearer token)        │  │ server  │    │ workflow  │    │  pipeline  │  │    (JSON-RPC)
//!                         │  └─────────┘    └─────┬─────┘    └─────┬──────┘  │
//!                         │                       │                │         │
//!                         │                       ▼                ▼         │
//!                         │                 ┌───────────┐   ┌────────────┐   │
//!                         │                 │   store   │   │ contracts  │   │
//!                         │                 │ (requests,│   │ (registry, │   │
//!                         │                 │ projections)   calldata)   │   │
//!                         │                 └─────┬─────┘   └────────────┘   │
//!   Verifier Request      │  ┌─────────┐         │                           │
//!   ──────────────────────┼─▶│ verify  │─────────┘                           │
//!   (public, read-only)   │  │resolver │◀── ledger validity tie-break        │
//!                         │  └─────────┘                                     │
//!                         │                                                   │
//!                         │  ┌─────────────────────────────────────────────┐ │
//!                         │  │           Cross-Cutting Concerns             │ │
//!                         │  │  ┌────────┐ ┌─────────────┐ ┌────────────┐  │ │
//!                         │  │  │ config │ │observability│ │  backend   │  │ │
//!                         │  │  │        │ │(logs+metrics)│ │ notifier   │  │ │
//!                         │  │  └────────┘ └─────────────┘ └────────────┘  │ │
//!                         │  └─────────────────────────────────────────────┘ │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credchain::chain::ChainCredentialLedger;
use credchain::config::loader::load_config;
use credchain::contracts::ContractRegistry;
use credchain::credentials::notifier::BackendNotifier;
use credchain::credentials::store::CredentialStore;
use credchain::credentials::CredentialWorkflow;
use credchain::http::HttpServer;
use credchain::verification::VerificationResolver;

#[derive(Parser)]
#[command(name = "credchain", about = "Academic credential chain service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "credchain.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    // Initialize tracing subscriber; RUST_LOG wins over the config level.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "credchain={},tower_http=info",
                    config.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "credchain starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.chain.rpc_url,
        expected_chain_id = ?config.chain.expected_chain_id,
        confirmation_blocks = config.chain.confirmation_blocks,
        "Configuration loaded"
    );

    // Initialize metrics server
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            credchain::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Store: resume from snapshot when persistence is configured.
    let store = match &config.store.persistence_path {
        Some(path) => CredentialStore::load_from_file(path)?,
        None => CredentialStore::new(None),
    };

    let registry = ContractRegistry::from_config(&config.contracts)?;
    let ledger = Arc::new(ChainCredentialLedger::new(&config.chain, registry)?);
    let chain = ledger.client().clone();

    if !chain.is_healthy().await {
        tracing::warn!("Ledger RPC unreachable at startup; continuing");
    }

    let notifier = BackendNotifier::new(config.backend.clone());
    let workflow = Arc::new(CredentialWorkflow::new(
        store.clone(),
        ledger.clone(),
        notifier,
    ));
    let resolver = Arc::new(VerificationResolver::new(store, ledger));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, workflow, resolver, chain);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

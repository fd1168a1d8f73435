//! Application entrypoint and state wiring.

use std::sync::Arc;

use clap::Parser;
use claim_ledger::config::NodeConfig;
use claim_ledger::crypto::fingerprint;
use claim_ledger::model::now_timestamp;
use claim_ledger::review::OfflineReviews;
use claim_ledger::routes::{self, AppState};
use claim_ledger::Ledger;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    // 0) config
    let config = NodeConfig::parse();
    let addr = match config.addr() {
        Ok(a) => a,
        Err(e) => {
            error!(host = %config.host, port = config.port, error = %e, "invalid listen address");
            std::process::exit(2);
        }
    };

    // 1) node identity
    let started = now_timestamp();
    let node_id = fingerprint(&[started.as_bytes(), &std::process::id().to_le_bytes()]);
    let node_id = node_id[..32].to_string();
    info!(%node_id, "node identifier generated");

    // 2) ledger with a mined genesis block
    let ledger = Ledger::new(config.difficulty, Arc::new(OfflineReviews));
    info!(difficulty = ledger.difficulty(), "ledger up and running");

    // 3) router
    let app = routes::router(AppState::new(ledger, node_id));

    // 4) serve
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "bind failed");
            std::process::exit(1);
        }
    };
    info!("running on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

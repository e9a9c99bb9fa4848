//! taskgated — the taskgate control daemon.
//!
//! Hosts the HTTP control protocol over the shared settings stores that
//! the in-kernel dispatch side reads. Attaching the dispatch policy to
//! the host scheduler is platform plumbing handled outside this binary;
//! everything reachable from here is the control plane.
//!
//! # Usage
//!
//! ```text
//! taskgated --port 8087
//! ```

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;

use taskgate_api::{build_router, ApiState, DEFAULT_PORT};
use taskgate_state::store::DEFAULT_CAPACITY;

#[derive(Parser)]
#[command(name = "taskgated", about = "Control server for the taskgate stopping scheduler")]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of settings entries per namespace.
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,taskgate=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let state = ApiState::new(cli.capacity, cli.port);
    info!(capacity = cli.capacity, "settings stores initialized");

    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    info!(%addr, "control server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("control server stopped");
    Ok(())
}

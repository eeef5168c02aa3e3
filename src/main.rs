//! OTC Offer Registry - Entry Point
//!
//! Initializes configuration and logging, seeds the in-memory ledger
//! and currency rail, restores the offer book, then serves JSON-lines
//! requests on stdin until EOF or SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging to stderr)
//! 3. Bootstrap the session (genesis state, persistence, metrics)
//! 4. Serve stdin → stdout, one reply line per request line
//! 5. On EOF or SIGINT → persist the book and exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use otc_offer_registry::adapters::console::Session;
use otc_offer_registry::config;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    // stdout carries protocol replies, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.registry.log_level)
                }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(
        name = %config.registry.name,
        version = env!("CARGO_PKG_VERSION"),
        assets = config.assets.len(),
        accounts = config.accounts.len(),
        persistence = config.persistence.enabled,
        "Starting OTC offer registry"
    );

    // ── 3. Bootstrap session ────────────────────────────────
    let session = Session::bootstrap(&config)
        .await
        .context("Failed to bootstrap registry session")?;

    // ── 4. Serve requests until EOF or SIGINT ───────────────
    tokio::select! {
        result = serve(&session) => {
            result?;
            info!("Input closed, shutting down");
        }
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // ── 5. Final snapshot ───────────────────────────────────
    if let Err(e) = session.persist().await {
        warn!(error = %e, "Failed to write final offer book snapshot");
    }

    info!(
        offers = session.registry().offer_count().await,
        "Shutdown complete"
    );
    Ok(())
}

/// Read request lines from stdin and write reply lines to stdout.
async fn serve(session: &Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let mut reply = session.handle_line(&line).await;
        reply.push('\n');
        stdout.write_all(reply.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

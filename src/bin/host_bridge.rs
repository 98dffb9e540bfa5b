//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` lines from stdin and writes `ResponseEnvelope` and
//! `EventEnvelope` lines to stdout. Tracing goes to stderr so stdout stays a
//! clean protocol channel.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use quickslot::QuickSlotConfig;
use quickslot::host::stdio::run_stdio_bridge;
use quickslot::host::{HostCollaborators, build_router};
use quickslot::privilege::{AccessibilityLink, NoBroker, RootShell};
use quickslot::slots::FileSlotStore;
use quickslot::trust::FileTrustStore;
use tracing_subscriber::EnvFilter;

/// Quick slot host: action dispatch and bridge trust gate over stdio.
#[derive(Parser)]
#[command(name = "quickslot-host", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quickslot=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => QuickSlotConfig::from_file(path)?,
        None => QuickSlotConfig::load_or_default()?,
    };

    let slots_path = config.storage.slots_path();
    let trust_path = config.storage.trust_path();
    tracing::info!(
        slots = %slots_path.display(),
        trust = %trust_path.display(),
        su = %config.executor.su_binary,
        "quickslot-host starting"
    );

    let router = build_router(
        HostCollaborators {
            slots: Arc::new(FileSlotStore::open(slots_path)?),
            trust: Arc::new(FileTrustStore::open(trust_path)?),
            accessibility: Arc::new(AccessibilityLink::new()),
            root_shell: Arc::new(RootShell::from_config(&config)),
            broker: Arc::new(NoBroker),
        },
        &config.host,
    );

    run_stdio_bridge(router, config.host.request_capacity)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "quickslot-host exited with error");
            anyhow::anyhow!("quickslot-host failed: {e}")
        })?;

    tracing::info!("quickslot-host shut down cleanly");
    Ok(())
}

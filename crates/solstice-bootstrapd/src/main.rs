//! solstice-bootstrapd — the genesis bootstrap coordinator daemon.
//!
//! Startup sequence:
//!   1. Create (or reuse) the data directory
//!   2. Restore a persisted genesis document, if one exists
//!   3. Serve `bootstrap_registerValidator` / `bootstrap_queryGenesis`
//!   4. Shut down on Ctrl-C

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use solstice_rpc::Coordinator;

#[derive(Parser, Debug)]
#[command(
    name = "solstice-bootstrapd",
    version,
    about = "Solstice genesis bootstrap coordinator"
)]
struct Args {
    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:26659")]
    listen_addr: SocketAddr,

    /// Number of distinct validator identities required to finalize genesis.
    #[arg(long)]
    threshold: NonZeroUsize,

    /// Directory for the persisted genesis document.
    #[arg(long, default_value = "~/.solstice/bootstrap")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,solstice=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("Solstice bootstrap coordinator starting");

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let handle = Coordinator::new(args.threshold.get(), &data_dir)
        .start(args.listen_addr)
        .await
        .context("starting RPC server")?;

    info!(threshold = args.threshold.get(), "coordinator ready");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("shutting down");
    let _ = handle.stop();
    handle.stopped().await;
    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

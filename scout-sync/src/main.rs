//! scout-sync daemon
//!
//! Keeps the local queues draining into the backend: probes reachability on
//! an interval, maintains the shared connectivity flag and flushes every
//! queue when the backend comes back.

use anyhow::{Context, Result};
use clap::Parser;
use scout_common::config::{resolve_root_folder, TomlConfig};
use scout_common::Variant;
use scout_sync::{RemoteStore, RestRemote, ScoutSync};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for scout-sync
#[derive(Parser, Debug)]
#[command(name = "scout-sync")]
#[command(about = "Offline-first scouting data sync daemon")]
#[command(version)]
struct Args {
    /// Folder holding the local database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long)]
    backend_url: Option<String>,

    /// Backend API key, overriding the config file
    #[arg(long, env = "SCOUT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Seconds between reachability probes, overriding the config file
    #[arg(long)]
    probe_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_deref());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());
    let log_file_error = match config.logging.open_file() {
        Ok(Some(file)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            None
        }
        Ok(None) => {
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
            None
        }
        Err(e) => {
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
            Some(e)
        }
    };

    info!("Starting scout-sync v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = log_file_error {
        warn!(error = %e, "Could not open log file, logging to stderr");
    }

    if let Some(url) = args.backend_url {
        config.backend_url = Some(url);
    }
    if let Some(key) = args.api_key {
        config.api_key = Some(key);
    }
    if let Some(secs) = args.probe_interval {
        config.probe_interval_secs = secs;
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), Some(&config));
    info!("Root folder: {}", root_folder.display());

    let remote = Arc::new(RestRemote::from_config(&config).context("Backend is not configured")?);
    let sync = ScoutSync::open(&root_folder, &config, remote.clone())
        .await
        .context("Failed to open local database")?;

    for variant in Variant::ALL {
        let queued = sync.queue().len(variant).await;
        info!(variant = %variant, queued, "Local queue loaded");
        for (team_id, updated_at) in sync.fusion().cached_teams(variant).await {
            info!(variant = %variant, team_id = %team_id, updated_at = %updated_at, "Cached remote rows available");
        }
    }

    let reupload_task = sync.spawn_reupload_on_reconnect();

    let probe_every = Duration::from_secs(config.probe_interval_secs.max(1));
    let mut probe = tokio::time::interval(probe_every);
    info!("Probing backend every {:?}", probe_every);

    loop {
        tokio::select! {
            _ = probe.tick() => {
                let online = match remote.ping().await {
                    Ok(()) => true,
                    Err(e) => {
                        if sync.connectivity().is_online() {
                            warn!(error = %e, "Backend unreachable");
                        }
                        false
                    }
                };
                sync.set_online(online);
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    reupload_task.abort();
    for variant in Variant::ALL {
        let queued = sync.queue().len(variant).await;
        if queued > 0 {
            info!(variant = %variant, queued, "Records left queued for the next run");
        }
    }
    info!("scout-sync stopped");
    Ok(())
}

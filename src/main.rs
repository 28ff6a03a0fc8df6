//! calendar-sync - Remote calendar feed synchronizer
//!
//! This is the main entry point for the calendar-sync application.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use calendar_sync::cache::{FeedCache, FilesystemFeedCache};
use calendar_sync::config::Config;
use calendar_sync::database::{CalendarStore, SqliteCalendarStore};
use calendar_sync::logging::init_tracing;
use calendar_sync::models::CalendarItem;
use calendar_sync::sync::{
    BatchSyncOrchestrator, FeedFetcher, ReqwestTransport, SchedulerConfig, SingleItemSyncer,
    SyncScheduler,
};

/// calendar-sync - Remote calendar feed synchronizer
#[derive(Parser, Debug)]
#[command(name = "calendar-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "CALENDAR_SYNC_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync every active calendar once
    Sync,
    /// Sync a single calendar by id
    SyncOne {
        /// Calendar id
        id: String,
    },
    /// Track a new calendar
    Add {
        /// Unique calendar id
        #[arg(long)]
        id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Feed URL
        #[arg(long)]
        url: String,
        /// Add the calendar without including it in batch syncs
        #[arg(long)]
        inactive: bool,
    },
    /// List tracked calendars
    List,
    /// Stop tracking a calendar
    Remove {
        /// Calendar id
        id: String,
    },
    /// Sync periodically until interrupted
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize tracing/logging
    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting calendar-sync"
    );

    // Initialize database
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let store: Arc<dyn CalendarStore> =
        Arc::new(SqliteCalendarStore::new(&config.database.path).await?);
    info!(path = %config.database.path, "Database initialized");

    match args.command {
        Command::Add {
            id,
            name,
            url,
            inactive,
        } => {
            let item = CalendarItem::new(id, name, url).with_active(!inactive);
            store.put_item(&item).await?;
            info!(calendar_id = %item.id, url = %item.url, "Calendar added");
            Ok(())
        }
        Command::List => {
            for item in store.list_items().await? {
                println!("{}", serde_json::to_string(&item)?);
            }
            Ok(())
        }
        Command::Remove { id } => {
            store.delete_item(&id).await?;
            info!(calendar_id = %id, "Calendar removed");
            Ok(())
        }
        Command::Sync => {
            let orchestrator = build_orchestrator(&config, store)?;
            let result = orchestrator.sync_all(None).await?;

            for failure in &result.errors {
                warn!(
                    calendar_id = %failure.calendar_id,
                    calendar_name = %failure.calendar_name,
                    error = %failure.error,
                    "Calendar failed"
                );
            }
            println!("{}", serde_json::to_string(&result)?);

            if result.failed_count > 0 {
                anyhow::bail!("{} calendar(s) failed to sync", result.failed_count);
            }
            Ok(())
        }
        Command::SyncOne { id } => {
            let orchestrator = build_orchestrator(&config, store)?;
            let outcome = orchestrator.sync_calendar(&id).await?;
            println!("{}", serde_json::to_string(&outcome)?);

            if !outcome.success {
                anyhow::bail!(
                    "Calendar {} failed to sync: {}",
                    id,
                    outcome.error.unwrap_or_default()
                );
            }
            Ok(())
        }
        Command::Daemon => run_daemon(&config, store).await,
    }
}

/// Wire the sync engine from configuration
fn build_orchestrator(
    config: &Config,
    store: Arc<dyn CalendarStore>,
) -> anyhow::Result<BatchSyncOrchestrator> {
    let transport = ReqwestTransport::new()?;
    let fetcher = FeedFetcher::from_config(Arc::new(transport), config);
    let cache: Arc<dyn FeedCache> =
        Arc::new(FilesystemFeedCache::new(&config.cache.calendar_cache_dir));
    info!(path = %config.cache.calendar_cache_dir, "Feed cache initialized");

    let syncer = SingleItemSyncer::new(
        fetcher,
        Arc::clone(&store),
        Arc::clone(&cache),
        config.sync.clone(),
    );

    Ok(BatchSyncOrchestrator::new(store, Arc::new(syncer), cache))
}

async fn run_daemon(config: &Config, store: Arc<dyn CalendarStore>) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config, store)?);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let scheduler = SyncScheduler::new(
        SchedulerConfig::from(&config.scheduler),
        orchestrator,
        shutdown_rx,
    );
    let handle = tokio::spawn(scheduler.run());

    info!(
        interval_secs = config.scheduler.interval_secs,
        "Scheduler started"
    );

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    if let Err(e) = handle.await {
        error!(error = %e, "Scheduler task failed");
    }

    info!("calendar-sync shutdown complete");
    Ok(())
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

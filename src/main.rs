use capper::adapters::{PostgresStore, ScoresClient, SocialClient};
use capper::config::{AppConfig, LoggingConfig};
use capper::domain::expert::RegistryFile;
use capper::error::Result;
use capper::services::{CancelFlag, GradingEngine, IngestionScheduler, LeaderboardAggregator};
use capper::WagerStore;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "capper", about = "Expert pick ingestion and grading pipeline")]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config", env = "CAPPER_CONFIG_DIR")]
    config_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server with the pass trigger endpoints
    Serve,
    /// Run one ingestion pass and print the report
    Ingest,
    /// Run one grading pass, fold the leaderboard, print the report
    Grade,
    /// Print the leaderboard sorted by net units
    Leaderboard {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Sync the expert registry file into the store
    SyncRegistry {
        #[arg(long, default_value = "config/experts.toml")]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config.logging);
    config.validate()?;

    let store = Arc::new(
        PostgresStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.migrate().await?;

    match cli.command {
        Commands::Serve => serve(config, store).await,
        Commands::Ingest => {
            let scheduler = build_scheduler(&config, store)?;
            let report = scheduler.run_pass(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Grade => {
            let feed = Arc::new(ScoresClient::new(&config.scores)?);
            let (engine, mut dirty_rx) =
                GradingEngine::new(store.clone(), feed, config.grading.clone());
            let report = engine.grade_pending().await?;

            let aggregator = LeaderboardAggregator::new(store);
            let recomputed = aggregator.drain_queue(&mut dirty_rx).await?;
            info!(recomputed, "leaderboard fold complete");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Leaderboard { limit } => {
            let stats = store.top_stats(limit).await?;
            println!(
                "{:<10} {:>5} {:>5} {:>5} {:>8} {:>9} {:>7} {:>7}",
                "expert", "W", "L", "P", "win%", "net units", "roi", "streak"
            );
            for s in stats {
                println!(
                    "{:<10} {:>5} {:>5} {:>5} {:>8.3} {:>9.2} {:>7.3} {:>7}",
                    s.expert_id, s.wins, s.losses, s.pushes, s.win_pct, s.net_units, s.roi, s.streak
                );
            }
            Ok(())
        }
        Commands::SyncRegistry { file } => sync_registry(store, &file).await,
    }
}

fn init_logging(cfg: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()));
    if cfg.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_scheduler(config: &AppConfig, store: Arc<PostgresStore>) -> Result<Arc<IngestionScheduler>> {
    let social = Arc::new(SocialClient::new(&config.social)?);
    Ok(Arc::new(IngestionScheduler::new(
        store,
        social,
        config.ingestion.clone(),
        CancelFlag::new(),
    )))
}

async fn serve(config: AppConfig, store: Arc<PostgresStore>) -> Result<()> {
    let scheduler = build_scheduler(&config, store.clone())?;
    let feed = Arc::new(ScoresClient::new(&config.scores)?);
    let (grader, dirty_rx) = GradingEngine::new(store.clone(), feed, config.grading.clone());
    let aggregator = Arc::new(LeaderboardAggregator::new(store.clone()));

    let state = capper::api::AppState {
        store,
        scheduler,
        grader: Arc::new(grader),
        aggregator,
        dirty_rx: Arc::new(Mutex::new(dirty_rx)),
        ingest_lock: Arc::new(Mutex::new(())),
        grade_lock: Arc::new(Mutex::new(())),
        start_time: Utc::now(),
    };

    let port = config.api_port.unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let router = capper::api::create_router(state);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

/// Load `config/experts.toml` and upsert every entry. Experts removed
/// from the file stay in the store; deactivate them there instead.
async fn sync_registry(store: Arc<PostgresStore>, file: &str) -> Result<()> {
    let registry: RegistryFile = config::Config::builder()
        .add_source(config::File::with_name(file))
        .build()?
        .try_deserialize()?;

    let mut synced = 0usize;
    for entry in &registry.experts {
        store.upsert_expert(entry).await?;
        synced += 1;
    }
    info!(synced, "registry sync complete");
    Ok(())
}

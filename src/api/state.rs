use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedReceiver, Mutex};

use crate::adapters::{PostgresStore, WagerStore};
use crate::services::{GradingEngine, IngestionScheduler, LeaderboardAggregator};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (health checks and read paths)
    pub store: Arc<PostgresStore>,
    pub scheduler: Arc<IngestionScheduler>,
    pub grader: Arc<GradingEngine>,
    pub aggregator: Arc<LeaderboardAggregator>,
    /// Expert ids the grading engine marked dirty, drained after each pass
    pub dirty_rx: Arc<Mutex<UnboundedReceiver<i64>>>,
    /// One ingestion pass at a time; a second trigger waits its turn
    pub ingest_lock: Arc<Mutex<()>>,
    pub grade_lock: Arc<Mutex<()>>,
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn wager_store(&self) -> Arc<dyn WagerStore> {
        self.store.clone()
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds().max(0) as u64
    }
}

pub mod grading;
pub mod ingestion;
pub mod leaderboard;

pub use grading::{GradingEngine, GradingReport};
pub use ingestion::{ExpertOutcome, IngestionReport, IngestionScheduler, PassState};
pub use leaderboard::LeaderboardAggregator;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operator-triggered cancellation checked between experts. Per-post work
/// commits atomically, so a cancelled pass leaves consistent state.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

//! Leaderboard aggregator: incremental per-expert rollups.
//!
//! Recomputation folds in only wagers graded since the stat row's
//! `last_updated_at`, keeping each update O(new wagers). The streak is
//! the one part that reads backwards from the most recent grade, bounded
//! by streak length, never full history.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapters::WagerStore;
use crate::domain::{LeaderboardStat, WagerResult};
use crate::error::Result;

/// Page size for the backwards streak walk
const STREAK_PAGE: i64 = 25;

pub struct LeaderboardAggregator {
    store: Arc<dyn WagerStore>,
    /// At-most-one concurrent recompute per expert id
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl LeaderboardAggregator {
    pub fn new(store: Arc<dyn WagerStore>) -> Self {
        Self { store, locks: DashMap::new() }
    }

    /// Recompute one expert's stats. Serialized per expert so two grading
    /// batches finishing close together cannot race a lost update.
    pub async fn recompute(&self, expert_id: i64) -> Result<LeaderboardStat> {
        let lock = self
            .locks
            .entry(expert_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut stat = self
            .store
            .get_stat(expert_id)
            .await?
            .unwrap_or_else(|| LeaderboardStat::empty(expert_id));

        let new = self.store.graded_since(expert_id, stat.last_updated_at).await?;
        if new.is_empty() {
            debug!(expert_id, "nothing newly graded, stats unchanged");
            return Ok(stat);
        }

        for wager in &new {
            match wager.result {
                Some(WagerResult::Win) => {
                    stat.wins += 1;
                    stat.units_risked += wager.units;
                }
                Some(WagerResult::Loss) => {
                    stat.losses += 1;
                    stat.units_risked += wager.units;
                }
                // a push returns its stake; it neither risks nor nets
                Some(WagerResult::Push) => stat.pushes += 1,
                None => {}
            }
            stat.net_units += wager.net_units();
            if let Some(at) = wager.graded_at {
                if at > stat.last_updated_at {
                    stat.last_updated_at = at;
                }
            }
        }
        stat.refresh_ratios();
        stat.streak = self.current_streak(expert_id).await?;

        self.store.upsert_stat(&stat).await?;
        info!(
            expert_id,
            wins = stat.wins,
            losses = stat.losses,
            streak = stat.streak,
            "leaderboard stats updated"
        );
        Ok(stat)
    }

    /// Drain the grading engine's dirty-expert queue and recompute each
    /// distinct expert once. A failed recompute is logged and the rest of
    /// the queue still folds; the expert is re-enqueued on its next grade.
    pub async fn drain_queue(&self, rx: &mut UnboundedReceiver<i64>) -> Result<usize> {
        let mut seen = HashSet::new();
        while let Ok(id) = rx.try_recv() {
            seen.insert(id);
        }
        let mut recomputed = 0;
        for id in &seen {
            match self.recompute(*id).await {
                Ok(_) => recomputed += 1,
                Err(e) => warn!(expert_id = *id, error = %e, "leaderboard recompute failed"),
            }
        }
        Ok(recomputed)
    }

    /// Walk graded wagers newest-first until a result breaks the streak
    /// direction. Pushes neither extend nor break a streak.
    async fn current_streak(&self, expert_id: i64) -> Result<i32> {
        let mut streak: i32 = 0;
        let mut offset: i64 = 0;

        loop {
            let page = self.store.recent_graded(expert_id, STREAK_PAGE, offset).await?;
            if page.is_empty() {
                return Ok(streak);
            }
            for wager in &page {
                match wager.result {
                    Some(WagerResult::Win) => {
                        if streak < 0 {
                            return Ok(streak);
                        }
                        streak += 1;
                    }
                    Some(WagerResult::Loss) => {
                        if streak > 0 {
                            return Ok(streak);
                        }
                        streak -= 1;
                    }
                    Some(WagerResult::Push) | None => {}
                }
            }
            offset += STREAK_PAGE;
        }
    }
}

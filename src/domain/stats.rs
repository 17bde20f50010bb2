use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-expert leaderboard rollup. Derived entirely from graded wagers and
/// owned exclusively by the aggregator; never hand-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardStat {
    pub expert_id: i64,
    pub wins: i32,
    pub losses: i32,
    pub pushes: i32,
    /// Wins over decisions (pushes excluded); zero when no decisions yet
    pub win_pct: Decimal,
    /// Total units risked across graded wagers (pushes return their stake)
    pub units_risked: Decimal,
    pub net_units: Decimal,
    /// net_units / units_risked; zero when nothing risked
    pub roi: Decimal,
    /// Signed streak: +3 means three straight wins, -2 two straight losses
    pub streak: i32,
    pub last_updated_at: DateTime<Utc>,
}

impl LeaderboardStat {
    /// Zero-valued row created lazily on an expert's first graded wager.
    /// `last_updated_at` at epoch so the first fold sees all history.
    pub fn empty(expert_id: i64) -> Self {
        Self {
            expert_id,
            wins: 0,
            losses: 0,
            pushes: 0,
            win_pct: Decimal::ZERO,
            units_risked: Decimal::ZERO,
            net_units: Decimal::ZERO,
            roi: Decimal::ZERO,
            streak: 0,
            last_updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn decisions(&self) -> i32 {
        self.wins + self.losses
    }

    /// Recompute the derived ratio fields from the running totals
    pub fn refresh_ratios(&mut self) {
        self.win_pct = if self.decisions() > 0 {
            Decimal::from(self.wins) / Decimal::from(self.decisions())
        } else {
            Decimal::ZERO
        };
        self.roi = if self.units_risked > Decimal::ZERO {
            self.net_units / self.units_risked
        } else {
            Decimal::ZERO
        };
    }
}

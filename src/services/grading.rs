//! Grading engine: reconcile pending wagers against final game results.
//!
//! Grading and aggregation are decoupled: every transition to `graded`
//! enqueues the expert id on a channel so a burst of grading never forces
//! synchronous recomputation per wager.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::adapters::{GameFeed, GameLookup, GameResult, WagerStore};
use crate::config::GradingConfig;
use crate::domain::{BetType, OverUnder, Sport, Wager, WagerResult};
use crate::error::Result;

/// Operator-visible grading pass summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct GradingReport {
    pub graded: usize,
    pub still_pending: usize,
    pub unresolved_game: usize,
    pub voided: usize,
}

pub struct GradingEngine {
    store: Arc<dyn WagerStore>,
    feed: Arc<dyn GameFeed>,
    cfg: GradingConfig,
    dirty_tx: UnboundedSender<i64>,
}

impl GradingEngine {
    /// Returns the engine and the receiver carrying expert ids whose
    /// leaderboard stats need recomputation.
    pub fn new(
        store: Arc<dyn WagerStore>,
        feed: Arc<dyn GameFeed>,
        cfg: GradingConfig,
    ) -> (Self, UnboundedReceiver<i64>) {
        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();
        (Self { store, feed, cfg, dirty_tx }, dirty_rx)
    }

    /// Grade every pending wager whose game has finished. Failures on one
    /// wager never block grading of others.
    pub async fn grade_pending(&self) -> Result<GradingReport> {
        let mut report = GradingReport::default();
        let pending = self.store.pending_wagers(self.cfg.batch_size).await?;
        info!(pending = pending.len(), "starting grading pass");

        for wager in &pending {
            // props without a resolvable line, and picks whose sport never
            // resolved, are manual-grading territory
            if wager.bet_type == BetType::Prop || wager.sport == Sport::Unknown {
                report.still_pending += 1;
                continue;
            }

            let lookup = match self
                .feed
                .final_result(wager.sport, wager.game_date, &wager.team)
                .await
            {
                Ok(lookup) => lookup,
                Err(e) => {
                    warn!(wager_id = %wager.id, error = %e, "oracle query failed");
                    report.still_pending += 1;
                    continue;
                }
            };

            match lookup {
                GameLookup::NotFinal => report.still_pending += 1,
                GameLookup::NotFound => {
                    report.unresolved_game += 1;
                    match self.store.bump_resolve_attempts(wager.id).await {
                        Ok(attempts) if attempts >= self.cfg.max_resolve_attempts => {
                            // bound unbounded retry growth
                            if let Err(e) = self.store.void_wager(wager.id).await {
                                warn!(wager_id = %wager.id, error = %e, "failed to void wager");
                            } else {
                                debug!(wager_id = %wager.id, attempts, "wager voided");
                                report.voided += 1;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(wager_id = %wager.id, error = %e, "failed to bump resolve attempts")
                        }
                    }
                }
                GameLookup::Final(game) => match settle(wager, &game) {
                    Some(result) => {
                        // per-wager stamp: graded_at orders the aggregator's
                        // incremental fold, so wagers in one pass must not
                        // share a timestamp
                        if let Err(e) = self
                            .store
                            .record_grade(wager.id, &game.game_id, result, Utc::now())
                            .await
                        {
                            warn!(wager_id = %wager.id, error = %e, "failed to record grade");
                            report.still_pending += 1;
                            continue;
                        }
                        report.graded += 1;
                        // aggregation is decoupled; drop means no consumer, fine
                        let _ = self.dirty_tx.send(wager.expert_id);
                    }
                    None => report.still_pending += 1,
                },
            }
        }

        info!(
            graded = report.graded,
            still_pending = report.still_pending,
            unresolved_game = report.unresolved_game,
            voided = report.voided,
            "grading pass complete"
        );
        Ok(report)
    }
}

/// Pure settlement of one wager against a final score. None means the
/// wager cannot be graded automatically (missing line, team not in game).
pub fn settle(wager: &Wager, game: &GameResult) -> Option<WagerResult> {
    let margin = game.margin_for(&wager.team)?;
    match wager.bet_type {
        BetType::Spread => Some(settle_spread(margin, wager.line?)),
        BetType::Total => Some(settle_total(game.total_points(), wager.line?, wager.side?)),
        BetType::Moneyline => Some(settle_moneyline(margin)),
        BetType::Prop => None,
    }
}

/// Spread: push iff the margin ties the line exactly, otherwise the bet
/// covers when margin + line is positive
pub fn settle_spread(margin: i32, line: Decimal) -> WagerResult {
    let margin = Decimal::from(margin);
    if margin == -line {
        WagerResult::Push
    } else if margin + line > Decimal::ZERO {
        WagerResult::Win
    } else {
        WagerResult::Loss
    }
}

/// Total: push on exact equality, else the chosen direction must match
pub fn settle_total(total_points: i32, line: Decimal, side: OverUnder) -> WagerResult {
    let total = Decimal::from(total_points);
    if total == line {
        WagerResult::Push
    } else {
        let went_over = total > line;
        let won = matches!(side, OverUnder::Over) == went_over;
        if won {
            WagerResult::Win
        } else {
            WagerResult::Loss
        }
    }
}

/// Moneyline: the selected team must win outright; no push
pub fn settle_moneyline(margin: i32) -> WagerResult {
    if margin > 0 {
        WagerResult::Win
    } else {
        WagerResult::Loss
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Sport;

/// Kind of bet extracted from post text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Spread,
    Moneyline,
    Total,
    Prop,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Spread => "spread",
            BetType::Moneyline => "moneyline",
            BetType::Total => "total",
            BetType::Prop => "prop",
        }
    }
}

impl TryFrom<&str> for BetType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "spread" => Ok(BetType::Spread),
            "moneyline" => Ok(BetType::Moneyline),
            "total" => Ok(BetType::Total),
            "prop" => Ok(BetType::Prop),
            other => Err(format!("unknown bet type: {other}")),
        }
    }
}

/// Direction of a total bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverUnder {
    Over,
    Under,
}

impl OverUnder {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverUnder::Over => "over",
            OverUnder::Under => "under",
        }
    }
}

impl TryFrom<&str> for OverUnder {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "over" => Ok(OverUnder::Over),
            "under" => Ok(OverUnder::Under),
            other => Err(format!("unknown total side: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Pending,
    Graded,
    Void,
}

impl WagerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Pending => "pending",
            WagerStatus::Graded => "graded",
            WagerStatus::Void => "void",
        }
    }
}

impl TryFrom<&str> for WagerStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(WagerStatus::Pending),
            "graded" => Ok(WagerStatus::Graded),
            "void" => Ok(WagerStatus::Void),
            other => Err(format!("unknown wager status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerResult {
    Win,
    Loss,
    Push,
}

impl WagerResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerResult::Win => "win",
            WagerResult::Loss => "loss",
            WagerResult::Push => "push",
        }
    }
}

impl TryFrom<&str> for WagerResult {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "win" => Ok(WagerResult::Win),
            "loss" => Ok(WagerResult::Loss),
            "push" => Ok(WagerResult::Push),
            other => Err(format!("unknown wager result: {other}")),
        }
    }
}

/// Output of parsing one post. A post may yield 0..N candidates;
/// parlay-style text yields one candidate per selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerCandidate {
    pub sport: Sport,
    /// Canonical team name, or raw subject text for props
    pub team: String,
    pub bet_type: BetType,
    /// Signed line; absent for moneyline
    pub line: Option<Decimal>,
    /// Direction for totals
    pub side: Option<OverUnder>,
    /// American odds; absent when the text did not state a price
    pub odds: Option<i32>,
    /// Units risked when the text sized the play, e.g. "2u"
    pub units: Option<Decimal>,
    /// How many of {team, bet type, line, odds} were unambiguously found
    pub confidence: f64,
    pub low_confidence: bool,
    /// Back-reference to the originating post
    pub source_post_id: String,
}

/// A candidate promoted into the system of record.
///
/// Ownership: ingestion creates rows; grading mutates status/result only;
/// nothing else writes here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub expert_id: i64,
    pub source_post_id: String,
    pub sport: Sport,
    pub team: String,
    pub bet_type: BetType,
    pub line: Option<Decimal>,
    pub side: Option<OverUnder>,
    pub odds: i32,
    pub units: Decimal,
    /// Resolved game id, set by the grading engine on first match
    pub game_id: Option<String>,
    /// Calendar date used for game resolution
    pub game_date: NaiveDate,
    pub status: WagerStatus,
    pub result: Option<WagerResult>,
    pub low_confidence: bool,
    /// Bounded counter; the wager is voided once this reaches the cap
    pub resolve_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Odds assumed when the text stated no price (standard juice)
pub const DEFAULT_ODDS: i32 = -110;

impl Wager {
    /// Promote a candidate for persistence. The game is resolved later,
    /// during grading; ingestion only records the calendar date.
    pub fn from_candidate(expert_id: i64, candidate: &WagerCandidate, posted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            expert_id,
            source_post_id: candidate.source_post_id.clone(),
            sport: candidate.sport,
            team: candidate.team.clone(),
            bet_type: candidate.bet_type,
            line: candidate.line,
            side: candidate.side,
            odds: candidate.odds.unwrap_or(DEFAULT_ODDS),
            units: candidate.units.unwrap_or(Decimal::ONE),
            game_id: None,
            game_date: posted_at.date_naive(),
            status: WagerStatus::Pending,
            result: None,
            low_confidence: candidate.low_confidence,
            resolve_attempts: 0,
            created_at: Utc::now(),
            graded_at: None,
        }
    }

    /// Profit in units if this wager wins, from American odds.
    /// +150 pays 1.5x the risk, -110 pays 100/110 of the risk.
    pub fn profit_on_win(&self) -> Decimal {
        profit_on_win(self.odds, self.units)
    }

    /// Net units for a graded wager: profit on win, -units on loss,
    /// zero on push.
    pub fn net_units(&self) -> Decimal {
        match self.result {
            Some(WagerResult::Win) => self.profit_on_win(),
            Some(WagerResult::Loss) => -self.units,
            Some(WagerResult::Push) | None => Decimal::ZERO,
        }
    }
}

pub fn profit_on_win(odds: i32, units: Decimal) -> Decimal {
    let hundred = Decimal::from(100);
    if odds >= 100 {
        units * Decimal::from(odds) / hundred
    } else if odds <= -100 {
        units * hundred / Decimal::from(-odds)
    } else {
        // malformed odds, treat as even money
        units
    }
}

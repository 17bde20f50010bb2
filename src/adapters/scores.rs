//! Game-results oracle client.
//!
//! Read-only scoreboard lookups by sport + date + team against a public
//! scoreboard API. The grading engine treats this as an oracle: it only
//! ever asks "is this game final, and what was the score".

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ScoresConfig;
use crate::domain::Sport;
use crate::error::{CapperError, Result};

/// Final score of one game
#[derive(Debug, Clone)]
pub struct GameResult {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
}

impl GameResult {
    /// Combined score, for totals
    pub fn total_points(&self) -> i32 {
        self.home_score + self.away_score
    }

    /// Final margin from `team`'s perspective (its score minus the
    /// opponent's), or None when the team is not in this game
    pub fn margin_for(&self, team: &str) -> Option<i32> {
        if team_name_matches(&self.home_team, team) {
            Some(self.home_score - self.away_score)
        } else if team_name_matches(&self.away_team, team) {
            Some(self.away_score - self.home_score)
        } else {
            None
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        team_name_matches(&self.home_team, team) || team_name_matches(&self.away_team, team)
    }
}

/// Outcome of one oracle query
#[derive(Debug, Clone)]
pub enum GameLookup {
    Final(GameResult),
    /// Game found but still in progress or scheduled
    NotFinal,
    /// No game for that team on that date
    NotFound,
}

/// Seam for the oracle so grading is testable with scripted results
#[async_trait]
pub trait GameFeed: Send + Sync {
    async fn final_result(&self, sport: Sport, date: NaiveDate, team: &str) -> Result<GameLookup>;
}

fn team_name_matches(feed_name: &str, team: &str) -> bool {
    let feed = feed_name.to_lowercase();
    let team = team.to_lowercase();
    feed == team || feed.contains(&team) || team.contains(&feed)
}

// ── Scoreboard JSON schemas ─────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    #[serde(default)]
    events: Vec<ScoreboardEvent>,
}

#[derive(Debug, Deserialize)]
struct ScoreboardEvent {
    id: String,
    competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
struct Competition {
    competitors: Vec<Competitor>,
    status: CompetitionStatus,
}

#[derive(Debug, Deserialize)]
struct Competitor {
    team: CompetitorTeam,
    #[serde(rename = "homeAway")]
    home_away: String,
    score: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompetitorTeam {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct CompetitionStatus {
    #[serde(rename = "type")]
    status_type: StatusType,
}

#[derive(Debug, Deserialize)]
struct StatusType {
    state: String,
}

// ── Client ──────────────────────────────────────────────────────

pub struct ScoresClient {
    http: Client,
    base_url: String,
}

impl ScoresClient {
    pub fn new(cfg: &ScoresConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| CapperError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_scoreboard(&self, sport: Sport, date: NaiveDate) -> Result<Vec<(String, Competition, bool)>> {
        let path = sport.feed_path().ok_or_else(|| {
            CapperError::Internal(format!("no scoreboard feed for sport {sport}"))
        })?;
        let url = format!("{}/{}/scoreboard", self.base_url, path);

        let resp: ScoreboardResponse = self
            .http
            .get(&url)
            .query(&[("dates", date.format("%Y%m%d").to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(%sport, %date, events = resp.events.len(), "fetched scoreboard");

        Ok(resp
            .events
            .into_iter()
            .filter_map(|e| {
                let id = e.id;
                e.competitions.into_iter().next().map(|c| {
                    let is_final = c.status.status_type.state == "post";
                    (id, c, is_final)
                })
            })
            .collect())
    }
}

/// Match one competition against the queried team. None when the team is
/// not in this game. A final game without numeric scores is held as
/// `NotFinal` rather than graded against phantom zeros.
fn competition_lookup(
    game_id: &str,
    comp: &Competition,
    is_final: bool,
    team: &str,
) -> Option<GameLookup> {
    let home = comp.competitors.iter().find(|c| c.home_away == "home")?;
    let away = comp.competitors.iter().find(|c| c.home_away == "away")?;

    let matched = team_name_matches(&home.team.display_name, team)
        || team_name_matches(&away.team.display_name, team);
    if !matched {
        return None;
    }

    if !is_final {
        return Some(GameLookup::NotFinal);
    }

    let parse_score = |c: &Competitor| c.score.as_deref().and_then(|s| s.parse::<i32>().ok());
    let (Some(home_score), Some(away_score)) = (parse_score(home), parse_score(away)) else {
        warn!(game_id, "final game missing numeric scores, holding");
        return Some(GameLookup::NotFinal);
    };

    Some(GameLookup::Final(GameResult {
        game_id: game_id.to_string(),
        home_team: home.team.display_name.clone(),
        away_team: away.team.display_name.clone(),
        home_score,
        away_score,
    }))
}

#[async_trait]
impl GameFeed for ScoresClient {
    async fn final_result(&self, sport: Sport, date: NaiveDate, team: &str) -> Result<GameLookup> {
        let games = self.fetch_scoreboard(sport, date).await?;

        for (game_id, comp, is_final) in games {
            if let Some(lookup) = competition_lookup(&game_id, &comp, is_final, team) {
                return Ok(lookup);
            }
        }

        Ok(GameLookup::NotFound)
    }
}

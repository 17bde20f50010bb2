use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, instrument};
use uuid::Uuid;

use super::WagerStore;
use crate::domain::expert::RegistryEntry;
use crate::domain::{
    BetType, Expert, LeaderboardStat, OverUnder, RawPost, Sport, Wager, WagerResult, WagerStatus,
};
use crate::error::{CapperError, Result};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_expert_row(r: &PgRow) -> Expert {
    let specialties: Vec<String> = r.get("specialties");
    Expert {
        id: r.get("id"),
        slug: r.get("slug"),
        display_name: r.get("display_name"),
        handle: r.get("handle"),
        tier: r.get::<i16, _>("tier") as u8,
        specialties: specialties
            .iter()
            .filter_map(|s| Sport::try_from(s.as_str()).ok())
            .collect(),
        network: r.get("network"),
        active: r.get("active"),
        last_polled_at: r.get("last_polled_at"),
    }
}

fn parse_wager_row(r: &PgRow) -> Result<Wager> {
    let sport: String = r.get("sport");
    let bet_type: String = r.get("bet_type");
    let side: Option<String> = r.get("side");
    let status: String = r.get("status");
    let result: Option<String> = r.get("result");

    Ok(Wager {
        id: r.get("id"),
        expert_id: r.get("expert_id"),
        source_post_id: r.get("source_post_id"),
        sport: Sport::try_from(sport.as_str()).unwrap_or(Sport::Unknown),
        team: r.get("team"),
        bet_type: BetType::try_from(bet_type.as_str()).map_err(CapperError::Internal)?,
        line: r.get::<Option<Decimal>, _>("line"),
        side: side.and_then(|s| OverUnder::try_from(s.as_str()).ok()),
        odds: r.get("odds"),
        units: r.get("units"),
        game_id: r.get("game_id"),
        game_date: r.get("game_date"),
        status: WagerStatus::try_from(status.as_str()).map_err(CapperError::Internal)?,
        result: result.and_then(|s| WagerResult::try_from(s.as_str()).ok()),
        low_confidence: r.get("low_confidence"),
        resolve_attempts: r.get("resolve_attempts"),
        created_at: r.get("created_at"),
        graded_at: r.get("graded_at"),
    })
}

fn parse_stat_row(r: &PgRow) -> LeaderboardStat {
    LeaderboardStat {
        expert_id: r.get("expert_id"),
        wins: r.get("wins"),
        losses: r.get("losses"),
        pushes: r.get("pushes"),
        win_pct: r.get("win_pct"),
        units_risked: r.get("units_risked"),
        net_units: r.get("net_units"),
        roi: r.get("roi"),
        streak: r.get("streak"),
        last_updated_at: r.get("last_updated_at"),
    }
}

const WAGER_COLUMNS: &str = "id, expert_id, source_post_id, sport, team, bet_type, line, side, \
     odds, units, game_id, game_date, status, result, low_confidence, resolve_attempts, \
     created_at, graded_at";

#[async_trait]
impl WagerStore for PostgresStore {
    async fn list_active_experts(&self) -> Result<Vec<Expert>> {
        let rows = sqlx::query(
            r#"
            SELECT id, slug, display_name, handle, tier, specialties, network, active, last_polled_at
            FROM experts
            WHERE active
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(parse_expert_row).collect())
    }

    #[instrument(skip(self, entry), fields(slug = %entry.slug))]
    async fn upsert_expert(&self, entry: &RegistryEntry) -> Result<i64> {
        let specialties: Vec<String> = entry
            .specialties
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let row = sqlx::query(
            r#"
            INSERT INTO experts (slug, display_name, handle, tier, specialties, network, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                handle = EXCLUDED.handle,
                tier = EXCLUDED.tier,
                specialties = EXCLUDED.specialties,
                network = EXCLUDED.network,
                active = EXCLUDED.active
            RETURNING id
            "#,
        )
        .bind(&entry.slug)
        .bind(&entry.display_name)
        .bind(&entry.handle)
        .bind(entry.tier as i16)
        .bind(&specialties)
        .bind(&entry.network)
        .bind(entry.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn mark_polled(&self, expert_id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE experts SET last_polled_at = $2 WHERE id = $1")
            .bind(expert_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_raw_post(&self, post: &RawPost) -> Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO raw_posts (post_id, author_handle, body, posted_at, likes, reposts)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (post_id) DO NOTHING
            "#,
        )
        .bind(&post.post_id)
        .bind(&post.author_handle)
        .bind(&post.text)
        .bind(post.posted_at)
        .bind(post.likes)
        .bind(post.reposts)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    #[instrument(skip(self, wager), fields(wager_id = %wager.id))]
    async fn insert_wager(&self, wager: &Wager) -> Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO wagers
                (id, expert_id, source_post_id, sport, team, bet_type, line, side,
                 odds, units, game_id, game_date, status, result, low_confidence,
                 resolve_attempts, created_at, graded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (expert_id, source_post_id, bet_type, COALESCE(line, 0)) DO NOTHING
            "#,
        )
        .bind(wager.id)
        .bind(wager.expert_id)
        .bind(&wager.source_post_id)
        .bind(wager.sport.as_str())
        .bind(&wager.team)
        .bind(wager.bet_type.as_str())
        .bind(wager.line)
        .bind(wager.side.map(|s| s.as_str()))
        .bind(wager.odds)
        .bind(wager.units)
        .bind(&wager.game_id)
        .bind(wager.game_date)
        .bind(wager.status.as_str())
        .bind(wager.result.map(|r| r.as_str()))
        .bind(wager.low_confidence)
        .bind(wager.resolve_attempts)
        .bind(wager.created_at)
        .bind(wager.graded_at)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn pending_wagers(&self, limit: i64) -> Result<Vec<Wager>> {
        // props and unresolved-sport wagers are manual-grading territory;
        // letting them into the batch would starve gradeable wagers once
        // the backlog reaches the batch size
        let rows = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers \
             WHERE status = 'pending' AND bet_type <> 'prop' AND sport <> 'unknown' \
             ORDER BY game_date, created_at LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_wager_row).collect()
    }

    #[instrument(skip(self))]
    async fn record_grade(
        &self,
        wager_id: Uuid,
        game_id: &str,
        result: WagerResult,
        graded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE wagers
            SET status = 'graded', result = $2, game_id = $3, graded_at = $4
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(wager_id)
        .bind(result.as_str())
        .bind(game_id)
        .bind(graded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bump_resolve_attempts(&self, wager_id: Uuid) -> Result<i32> {
        let row = sqlx::query(
            r#"
            UPDATE wagers SET resolve_attempts = resolve_attempts + 1
            WHERE id = $1
            RETURNING resolve_attempts
            "#,
        )
        .bind(wager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("resolve_attempts"))
    }

    async fn void_wager(&self, wager_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE wagers SET status = 'void' WHERE id = $1 AND status = 'pending'")
            .bind(wager_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn graded_since(&self, expert_id: i64, since: DateTime<Utc>) -> Result<Vec<Wager>> {
        let rows = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers \
             WHERE expert_id = $1 AND status = 'graded' AND graded_at > $2 \
             ORDER BY graded_at"
        ))
        .bind(expert_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_wager_row).collect()
    }

    async fn recent_graded(&self, expert_id: i64, limit: i64, offset: i64) -> Result<Vec<Wager>> {
        let rows = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers \
             WHERE expert_id = $1 AND status = 'graded' \
             ORDER BY graded_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(expert_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_wager_row).collect()
    }

    async fn get_stat(&self, expert_id: i64) -> Result<Option<LeaderboardStat>> {
        let row = sqlx::query(
            r#"
            SELECT expert_id, wins, losses, pushes, win_pct, units_risked,
                   net_units, roi, streak, last_updated_at
            FROM leaderboard_stats WHERE expert_id = $1
            "#,
        )
        .bind(expert_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parse_stat_row))
    }

    #[instrument(skip(self, stat), fields(expert_id = stat.expert_id))]
    async fn upsert_stat(&self, stat: &LeaderboardStat) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO leaderboard_stats
                (expert_id, wins, losses, pushes, win_pct, units_risked,
                 net_units, roi, streak, last_updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (expert_id) DO UPDATE SET
                wins = EXCLUDED.wins,
                losses = EXCLUDED.losses,
                pushes = EXCLUDED.pushes,
                win_pct = EXCLUDED.win_pct,
                units_risked = EXCLUDED.units_risked,
                net_units = EXCLUDED.net_units,
                roi = EXCLUDED.roi,
                streak = EXCLUDED.streak,
                last_updated_at = EXCLUDED.last_updated_at
            "#,
        )
        .bind(stat.expert_id)
        .bind(stat.wins)
        .bind(stat.losses)
        .bind(stat.pushes)
        .bind(stat.win_pct)
        .bind(stat.units_risked)
        .bind(stat.net_units)
        .bind(stat.roi)
        .bind(stat.streak)
        .bind(stat.last_updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn top_stats(&self, limit: i64) -> Result<Vec<LeaderboardStat>> {
        let rows = sqlx::query(
            r#"
            SELECT expert_id, wins, losses, pushes, win_pct, units_risked,
                   net_units, roi, streak, last_updated_at
            FROM leaderboard_stats
            ORDER BY net_units DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(parse_stat_row).collect())
    }

    async fn needs_review(&self, limit: i64) -> Result<Vec<Wager>> {
        let rows = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers \
             WHERE status = 'pending' AND low_confidence \
             ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_wager_row).collect()
    }
}

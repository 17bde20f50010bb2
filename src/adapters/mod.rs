pub mod postgres;
pub mod scores;
pub mod social;

pub use postgres::PostgresStore;
pub use scores::{GameFeed, GameLookup, GameResult, ScoresClient};
pub use social::{SocialApi, SocialClient, SocialUser};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::expert::RegistryEntry;
use crate::domain::{Expert, LeaderboardStat, RawPost, Wager, WagerResult};
use crate::error::Result;

/// Persistence seam for the pipeline. Implemented by [`PostgresStore`];
/// tests substitute an in-memory fake to instrument call counts.
#[async_trait]
pub trait WagerStore: Send + Sync {
    // -- expert registry --
    async fn list_active_experts(&self) -> Result<Vec<Expert>>;
    async fn upsert_expert(&self, entry: &RegistryEntry) -> Result<i64>;
    async fn mark_polled(&self, expert_id: i64, at: DateTime<Utc>) -> Result<()>;

    // -- ingestion (write-once rows) --
    /// Returns false when the post was already on record
    async fn insert_raw_post(&self, post: &RawPost) -> Result<bool>;
    /// Returns false on a dedup-key conflict, which callers treat as success
    async fn insert_wager(&self, wager: &Wager) -> Result<bool>;

    // -- grading (status/result mutation only) --
    async fn pending_wagers(&self, limit: i64) -> Result<Vec<Wager>>;
    async fn record_grade(
        &self,
        wager_id: Uuid,
        game_id: &str,
        result: WagerResult,
        graded_at: DateTime<Utc>,
    ) -> Result<()>;
    /// Bump the bounded retry counter; returns the new count
    async fn bump_resolve_attempts(&self, wager_id: Uuid) -> Result<i32>;
    async fn void_wager(&self, wager_id: Uuid) -> Result<()>;

    // -- aggregation --
    /// Graded wagers with graded_at strictly after `since`, oldest first
    async fn graded_since(&self, expert_id: i64, since: DateTime<Utc>) -> Result<Vec<Wager>>;
    /// Graded wagers newest first, paged for streak walks
    async fn recent_graded(&self, expert_id: i64, limit: i64, offset: i64) -> Result<Vec<Wager>>;
    async fn get_stat(&self, expert_id: i64) -> Result<Option<LeaderboardStat>>;
    async fn upsert_stat(&self, stat: &LeaderboardStat) -> Result<()>;

    // -- read paths --
    async fn top_stats(&self, limit: i64) -> Result<Vec<LeaderboardStat>>;
    async fn needs_review(&self, limit: i64) -> Result<Vec<Wager>>;
}

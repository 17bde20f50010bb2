//! In-memory fakes for the pipeline seams. Call counters make access
//! patterns observable, which the aggregator incrementality tests rely on.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::adapters::scores::{GameFeed, GameLookup, GameResult};
use crate::adapters::social::{SocialApi, SocialUser};
use crate::adapters::WagerStore;
use crate::domain::expert::RegistryEntry;
use crate::domain::{
    BetType, Expert, LeaderboardStat, RawPost, Sport, Wager, WagerResult, WagerStatus,
};
use crate::error::{CapperError, Result};

// ── MemStore ────────────────────────────────────────────────────

#[derive(Default)]
struct MemStoreInner {
    experts: Vec<Expert>,
    raw_posts: HashMap<String, RawPost>,
    wagers: Vec<Wager>,
    stats: HashMap<i64, LeaderboardStat>,
    next_expert_id: i64,
    graded_seq: i64,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemStoreInner>,
    graded_since_calls: AtomicUsize,
    recent_graded_calls: AtomicUsize,
    last_graded_since_len: AtomicUsize,
    /// Experts whose stat reads fail, for error-path tests
    failing_stat_reads: Mutex<HashSet<i64>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_expert(
        &self,
        slug: &str,
        handle: Option<&str>,
        tier: u8,
        specialties: &[Sport],
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_expert_id += 1;
        let id = inner.next_expert_id;
        inner.experts.push(Expert {
            id,
            slug: slug.to_string(),
            display_name: slug.to_string(),
            handle: handle.map(str::to_string),
            tier,
            specialties: specialties.to_vec(),
            network: None,
            active: true,
            last_polled_at: None,
        });
        id
    }

    pub fn set_last_polled(&self, expert_id: i64, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(e) = inner.experts.iter_mut().find(|e| e.id == expert_id) {
            e.last_polled_at = Some(at);
        }
    }

    fn base_wager(expert_id: i64, post_id: &str, team: &str, date: NaiveDate) -> Wager {
        Wager {
            id: Uuid::new_v4(),
            expert_id,
            source_post_id: post_id.to_string(),
            sport: Sport::Nfl,
            team: team.to_string(),
            bet_type: BetType::Spread,
            line: None,
            side: None,
            odds: -110,
            units: Decimal::ONE,
            game_id: None,
            game_date: date,
            status: WagerStatus::Pending,
            result: None,
            low_confidence: false,
            resolve_attempts: 0,
            created_at: Utc::now(),
            graded_at: None,
        }
    }

    pub fn seed_pending_spread(
        &self,
        expert_id: i64,
        post_id: &str,
        team: &str,
        line: Decimal,
        date: NaiveDate,
    ) -> Uuid {
        let mut w = Self::base_wager(expert_id, post_id, team, date);
        w.line = Some(line);
        let id = w.id;
        self.inner.lock().unwrap().wagers.push(w);
        id
    }

    pub fn seed_pending_prop(
        &self,
        expert_id: i64,
        post_id: &str,
        subject: &str,
        date: NaiveDate,
    ) -> Uuid {
        let mut w = Self::base_wager(expert_id, post_id, subject, date);
        w.bet_type = BetType::Prop;
        let id = w.id;
        self.inner.lock().unwrap().wagers.push(w);
        id
    }

    /// Graded wagers get strictly increasing graded_at timestamps so the
    /// seeded order is the chronological order.
    pub fn seed_graded(
        &self,
        expert_id: i64,
        post_id: &str,
        result: WagerResult,
        odds: i32,
        units: Decimal,
    ) -> Uuid {
        let mut inner = self.inner.lock().unwrap();
        inner.graded_seq += 1;
        let seq = inner.graded_seq;
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        let mut w = Self::base_wager(expert_id, post_id, "Kansas City Chiefs", date);
        w.line = Some(Decimal::from(-3));
        w.odds = odds;
        w.units = units;
        w.status = WagerStatus::Graded;
        w.result = Some(result);
        w.graded_at = Some(Utc.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap() + Duration::seconds(seq));
        let id = w.id;
        inner.wagers.push(w);
        id
    }

    pub fn raw_post_count(&self) -> usize {
        self.inner.lock().unwrap().raw_posts.len()
    }

    pub fn wager_count(&self) -> usize {
        self.inner.lock().unwrap().wagers.len()
    }

    pub fn graded_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .filter(|w| w.status == WagerStatus::Graded)
            .count()
    }

    pub fn resolve_attempts(&self, wager_id: Uuid) -> i32 {
        self.inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .find(|w| w.id == wager_id)
            .map(|w| w.resolve_attempts)
            .unwrap_or(0)
    }

    pub fn is_void(&self, wager_id: Uuid) -> bool {
        self.inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .any(|w| w.id == wager_id && w.status == WagerStatus::Void)
    }

    pub fn get_stat_sync(&self, expert_id: i64) -> Option<LeaderboardStat> {
        self.inner.lock().unwrap().stats.get(&expert_id).cloned()
    }

    pub fn fail_stat_reads(&self, expert_id: i64) {
        self.failing_stat_reads.lock().unwrap().insert(expert_id);
    }

    pub fn graded_since_calls(&self) -> usize {
        self.graded_since_calls.load(Ordering::SeqCst)
    }

    pub fn recent_graded_calls(&self) -> usize {
        self.recent_graded_calls.load(Ordering::SeqCst)
    }

    pub fn last_graded_since_len(&self) -> usize {
        self.last_graded_since_len.load(Ordering::SeqCst)
    }

    fn dedup_key(w: &Wager) -> (i64, String, &'static str, Decimal) {
        (
            w.expert_id,
            w.source_post_id.clone(),
            w.bet_type.as_str(),
            w.line.unwrap_or_default(),
        )
    }
}

#[async_trait]
impl WagerStore for MemStore {
    async fn list_active_experts(&self) -> Result<Vec<Expert>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .experts
            .iter()
            .filter(|e| e.active)
            .cloned()
            .collect())
    }

    async fn upsert_expert(&self, entry: &RegistryEntry) -> Result<i64> {
        let existing = {
            let inner = self.inner.lock().unwrap();
            inner.experts.iter().find(|e| e.slug == entry.slug).map(|e| e.id)
        };
        match existing {
            Some(id) => Ok(id),
            None => Ok(self.seed_expert(
                &entry.slug,
                entry.handle.as_deref(),
                entry.tier,
                &entry.specialties,
            )),
        }
    }

    async fn mark_polled(&self, expert_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.set_last_polled(expert_id, at);
        Ok(())
    }

    async fn insert_raw_post(&self, post: &RawPost) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.raw_posts.contains_key(&post.post_id) {
            return Ok(false);
        }
        inner.raw_posts.insert(post.post_id.clone(), post.clone());
        Ok(true)
    }

    async fn insert_wager(&self, wager: &Wager) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let key = Self::dedup_key(wager);
        if inner.wagers.iter().any(|w| Self::dedup_key(w) == key) {
            return Ok(false);
        }
        inner.wagers.push(wager.clone());
        Ok(true)
    }

    async fn pending_wagers(&self, limit: i64) -> Result<Vec<Wager>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .filter(|w| {
                w.status == WagerStatus::Pending
                    && w.bet_type != BetType::Prop
                    && w.sport != Sport::Unknown
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record_grade(
        &self,
        wager_id: Uuid,
        game_id: &str,
        result: WagerResult,
        graded_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.wagers.iter_mut().find(|w| w.id == wager_id) {
            w.status = WagerStatus::Graded;
            w.result = Some(result);
            w.game_id = Some(game_id.to_string());
            w.graded_at = Some(graded_at);
        }
        Ok(())
    }

    async fn bump_resolve_attempts(&self, wager_id: Uuid) -> Result<i32> {
        let mut inner = self.inner.lock().unwrap();
        let w = inner
            .wagers
            .iter_mut()
            .find(|w| w.id == wager_id)
            .ok_or_else(|| CapperError::Internal(format!("no wager {wager_id}")))?;
        w.resolve_attempts += 1;
        Ok(w.resolve_attempts)
    }

    async fn void_wager(&self, wager_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner
            .wagers
            .iter_mut()
            .find(|w| w.id == wager_id && w.status == WagerStatus::Pending)
        {
            w.status = WagerStatus::Void;
        }
        Ok(())
    }

    async fn graded_since(&self, expert_id: i64, since: DateTime<Utc>) -> Result<Vec<Wager>> {
        self.graded_since_calls.fetch_add(1, Ordering::SeqCst);
        let mut out: Vec<Wager> = self
            .inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .filter(|w| {
                w.expert_id == expert_id
                    && w.status == WagerStatus::Graded
                    && w.graded_at.is_some_and(|at| at > since)
            })
            .cloned()
            .collect();
        out.sort_by_key(|w| w.graded_at);
        self.last_graded_since_len.store(out.len(), Ordering::SeqCst);
        Ok(out)
    }

    async fn recent_graded(&self, expert_id: i64, limit: i64, offset: i64) -> Result<Vec<Wager>> {
        self.recent_graded_calls.fetch_add(1, Ordering::SeqCst);
        let mut all: Vec<Wager> = self
            .inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .filter(|w| w.expert_id == expert_id && w.status == WagerStatus::Graded)
            .cloned()
            .collect();
        all.sort_by_key(|w| std::cmp::Reverse(w.graded_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_stat(&self, expert_id: i64) -> Result<Option<LeaderboardStat>> {
        if self.failing_stat_reads.lock().unwrap().contains(&expert_id) {
            return Err(CapperError::Internal(format!(
                "stat read failed for expert {expert_id}"
            )));
        }
        Ok(self.get_stat_sync(expert_id))
    }

    async fn upsert_stat(&self, stat: &LeaderboardStat) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .stats
            .insert(stat.expert_id, stat.clone());
        Ok(())
    }

    async fn top_stats(&self, limit: i64) -> Result<Vec<LeaderboardStat>> {
        let mut stats: Vec<LeaderboardStat> =
            self.inner.lock().unwrap().stats.values().cloned().collect();
        stats.sort_by(|a, b| b.net_units.cmp(&a.net_units));
        stats.truncate(limit as usize);
        Ok(stats)
    }

    async fn needs_review(&self, limit: i64) -> Result<Vec<Wager>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .wagers
            .iter()
            .filter(|w| w.status == WagerStatus::Pending && w.low_confidence)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ── FakeSocial ──────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSocial {
    timelines: Mutex<HashMap<String, Vec<RawPost>>>,
    searches: Mutex<HashMap<String, Vec<RawPost>>>,
    timeline_calls: AtomicUsize,
    timeline_order: Mutex<Vec<String>>,
    search_calls: AtomicUsize,
    /// Timeline fetches beyond this count return `RateLimited`
    rate_limit_after: Mutex<Option<usize>>,
    /// Search fetches beyond this count return `RateLimited`
    rate_limit_search_after: Mutex<Option<usize>>,
}

impl FakeSocial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_timeline(&self, handle: &str, posts: Vec<RawPost>) {
        self.timelines
            .lock()
            .unwrap()
            .insert(handle.to_lowercase(), posts);
    }

    pub fn add_search(&self, query: &str, posts: Vec<RawPost>) {
        self.searches
            .lock()
            .unwrap()
            .insert(query.to_string(), posts);
    }

    pub fn rate_limit_after(&self, successful_fetches: usize) {
        *self.rate_limit_after.lock().unwrap() = Some(successful_fetches);
    }

    pub fn rate_limit_search_after(&self, successful_searches: usize) {
        *self.rate_limit_search_after.lock().unwrap() = Some(successful_searches);
    }

    pub fn timeline_calls(&self) -> usize {
        self.timeline_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn timeline_order(&self) -> Vec<String> {
        self.timeline_order.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialApi for FakeSocial {
    async fn fetch_users_by_handles(&self, handles: &[String]) -> Result<Vec<SocialUser>> {
        Ok(handles
            .iter()
            .map(|h| SocialUser {
                id: format!("uid-{}", h.to_lowercase()),
                username: h.clone(),
                name: h.clone(),
            })
            .collect())
    }

    async fn fetch_recent_posts(
        &self,
        _user_id: &str,
        handle: &str,
        max: u32,
    ) -> Result<Vec<RawPost>> {
        let calls = self.timeline_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(cap) = *self.rate_limit_after.lock().unwrap() {
            if calls >= cap {
                return Err(CapperError::RateLimited {
                    retry_after: std::time::Duration::from_secs(900),
                });
            }
        }
        self.timeline_order
            .lock()
            .unwrap()
            .push(handle.to_lowercase());
        let posts = self
            .timelines
            .lock()
            .unwrap()
            .get(&handle.to_lowercase())
            .cloned()
            .unwrap_or_default();
        Ok(posts.into_iter().take(max as usize).collect())
    }

    async fn search_recent_posts(&self, query: &str, max: u32) -> Result<Vec<RawPost>> {
        let calls = self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(cap) = *self.rate_limit_search_after.lock().unwrap() {
            if calls >= cap {
                return Err(CapperError::RateLimited {
                    retry_after: std::time::Duration::from_secs(900),
                });
            }
        }
        let posts = self
            .searches
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        Ok(posts.into_iter().take(max as usize).collect())
    }
}

// ── FakeFeed ────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeFeed {
    finals: Mutex<Vec<(Sport, NaiveDate, GameResult)>>,
    in_progress: Mutex<Vec<(Sport, NaiveDate, String)>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_final(&self, sport: Sport, date: NaiveDate, game: GameResult) {
        self.finals.lock().unwrap().push((sport, date, game));
    }

    pub fn set_not_final(&self, sport: Sport, date: NaiveDate, team: &str) {
        self.in_progress
            .lock()
            .unwrap()
            .push((sport, date, team.to_lowercase()));
    }
}

#[async_trait]
impl GameFeed for FakeFeed {
    async fn final_result(&self, sport: Sport, date: NaiveDate, team: &str) -> Result<GameLookup> {
        let team_lower = team.to_lowercase();
        if self
            .in_progress
            .lock()
            .unwrap()
            .iter()
            .any(|(s, d, t)| *s == sport && *d == date && *t == team_lower)
        {
            return Ok(GameLookup::NotFinal);
        }
        let hit = self
            .finals
            .lock()
            .unwrap()
            .iter()
            .find(|(s, d, g)| *s == sport && *d == date && g.involves(team))
            .map(|(_, _, g)| g.clone());
        Ok(match hit {
            Some(game) => GameLookup::Final(game),
            None => GameLookup::NotFound,
        })
    }
}

//! Ingestion scheduler: one run-to-completion pass over the expert
//! registry.
//!
//! Polling is sequential because the upstream rate limit is global, not
//! per-expert. The first `RateLimited` error stops further fetch calls for
//! the rest of the pass; not-yet-polled experts are recorded as skipped
//! and retried next run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::CancelFlag;
use crate::adapters::social::USER_LOOKUP_BATCH_CAP;
use crate::adapters::{SocialApi, WagerStore};
use crate::config::IngestionConfig;
use crate::domain::{Expert, RawPost, Wager};
use crate::error::{CapperError, Result};
use crate::extract::Extractor;

/// Terminal state of one expert within one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassState {
    Stored,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpertOutcome {
    pub expert_id: i64,
    pub slug: String,
    pub state: PassState,
}

/// Operator-visible pass summary: counts, never raw data
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub fetched: usize,
    pub parsed: usize,
    pub stored: usize,
    pub skipped: usize,
    pub errors: usize,
    pub outcomes: Vec<ExpertOutcome>,
}

pub struct IngestionScheduler {
    store: Arc<dyn WagerStore>,
    social: Arc<dyn SocialApi>,
    extractor: Extractor,
    cfg: IngestionConfig,
    cancel: CancelFlag,
}

impl IngestionScheduler {
    pub fn new(
        store: Arc<dyn WagerStore>,
        social: Arc<dyn SocialApi>,
        cfg: IngestionConfig,
        cancel: CancelFlag,
    ) -> Self {
        let extractor = Extractor::new(cfg.low_confidence_threshold);
        Self { store, social, extractor, cfg, cancel }
    }

    /// Run one ingestion pass. Per-expert and per-post failures are
    /// recorded in the report; only startup errors abort the pass.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<IngestionReport> {
        let mut report = IngestionReport::default();

        let experts = self.store.list_active_experts().await?;
        let by_handle: HashMap<String, Expert> = experts
            .iter()
            .filter_map(|e| e.handle.clone().map(|h| (h.to_lowercase(), e.clone())))
            .collect();

        let due = self.due_experts(experts, now);
        info!(due = due.len(), "starting ingestion pass");

        // Resolve handles to user ids up front, chunked to the upstream cap.
        // A rate limit here defers the entire pass.
        let handles: Vec<String> = due.iter().filter_map(|e| e.handle.clone()).collect();
        let users = match self.resolve_users(&handles).await {
            Ok(users) => users,
            Err(CapperError::RateLimited { retry_after }) => {
                warn!(?retry_after, "rate limited during user lookup, deferring pass");
                for e in &due {
                    report.skipped += 1;
                    report.outcomes.push(outcome(e, PassState::Skipped));
                }
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        let mut deferred = false;
        for expert in &due {
            if deferred || self.cancel.is_cancelled() {
                report.skipped += 1;
                report.outcomes.push(outcome(expert, PassState::Skipped));
                continue;
            }

            let handle = expert.handle.as_deref().unwrap_or_default();
            let Some(user) = users.get(&handle.to_lowercase()) else {
                warn!(slug = %expert.slug, handle, "handle not found upstream");
                report.errors += 1;
                report.outcomes.push(outcome(expert, PassState::Failed));
                continue;
            };

            match self
                .social
                .fetch_recent_posts(&user.0, handle, self.cfg.posts_per_expert)
                .await
            {
                Ok(posts) => {
                    report.fetched += posts.len();
                    self.ingest_posts(expert, &posts, &mut report).await;
                    if let Err(e) = self.store.mark_polled(expert.id, now).await {
                        warn!(slug = %expert.slug, error = %e, "failed to mark expert polled");
                        report.errors += 1;
                    }
                    report.outcomes.push(outcome(expert, PassState::Stored));
                }
                Err(CapperError::RateLimited { retry_after }) => {
                    warn!(slug = %expert.slug, ?retry_after, "rate limited, deferring rest of pass");
                    deferred = true;
                    report.skipped += 1;
                    report.outcomes.push(outcome(expert, PassState::Skipped));
                }
                Err(e) => {
                    warn!(slug = %expert.slug, error = %e, "timeline fetch failed");
                    report.errors += 1;
                    report.outcomes.push(outcome(expert, PassState::Failed));
                }
            }
        }

        if !deferred && !self.cancel.is_cancelled() {
            self.run_searches(&by_handle, &mut report).await;
        }

        info!(
            fetched = report.fetched,
            parsed = report.parsed,
            stored = report.stored,
            skipped = report.skipped,
            errors = report.errors,
            "ingestion pass complete"
        );
        Ok(report)
    }

    /// Experts due for polling, ordered by descending tier with ties
    /// broken by longest time since last poll (starvation avoidance)
    fn due_experts(&self, experts: Vec<Expert>, now: DateTime<Utc>) -> Vec<Expert> {
        let mut due: Vec<Expert> = experts
            .into_iter()
            .filter(|e| e.handle.is_some())
            .filter(|e| e.is_due(now, self.cfg.poll_interval_secs(e.tier)))
            .collect();
        due.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then_with(|| {
                    // None sorts first: never-polled experts are the most starved
                    match (a.last_polled_at, b.last_polled_at) {
                        (None, None) => std::cmp::Ordering::Equal,
                        (None, Some(_)) => std::cmp::Ordering::Less,
                        (Some(_), None) => std::cmp::Ordering::Greater,
                        (Some(x), Some(y)) => x.cmp(&y),
                    }
                })
        });
        due
    }

    async fn resolve_users(&self, handles: &[String]) -> Result<HashMap<String, (String, String)>> {
        let mut users = HashMap::new();
        for chunk in handles.chunks(USER_LOOKUP_BATCH_CAP) {
            for u in self.social.fetch_users_by_handles(chunk).await? {
                users.insert(u.username.to_lowercase(), (u.id, u.username));
            }
        }
        Ok(users)
    }

    /// Persist posts (always, for audit) and promote extracted candidates.
    /// Each post commits independently; one bad post never aborts the run.
    async fn ingest_posts(&self, expert: &Expert, posts: &[RawPost], report: &mut IngestionReport) {
        for post in posts {
            if let Err(e) = self.store.insert_raw_post(post).await {
                warn!(post_id = %post.post_id, error = %e, "failed to persist raw post");
                report.errors += 1;
                continue;
            }

            let candidates = self.extractor.extract(post, &expert.specialties);
            report.parsed += candidates.len();

            for candidate in candidates {
                let wager = Wager::from_candidate(expert.id, &candidate, post.posted_at);
                match self.store.insert_wager(&wager).await {
                    // dedup conflicts are success, not error
                    Ok(true) => report.stored += 1,
                    Ok(false) => {
                        debug!(post_id = %post.post_id, "wager already on record");
                    }
                    Err(e) => {
                        warn!(post_id = %post.post_id, error = %e, "failed to insert wager");
                        report.errors += 1;
                    }
                }
            }
        }
    }

    /// Standing search queries: audit every hit, and promote candidates
    /// for posts authored by tracked experts.
    async fn run_searches(&self, by_handle: &HashMap<String, Expert>, report: &mut IngestionReport) {
        for query in &self.cfg.search_queries {
            match self
                .social
                .search_recent_posts(query, self.cfg.posts_per_expert)
                .await
            {
                Ok(posts) => {
                    report.fetched += posts.len();
                    for post in posts {
                        match by_handle.get(&post.author_handle.to_lowercase()) {
                            Some(expert) => {
                                self.ingest_posts(expert, std::slice::from_ref(&post), report)
                                    .await;
                            }
                            None => {
                                if let Err(e) = self.store.insert_raw_post(&post).await {
                                    warn!(post_id = %post.post_id, error = %e, "failed to persist search hit");
                                    report.errors += 1;
                                }
                            }
                        }
                    }
                }
                Err(CapperError::RateLimited { .. }) => {
                    debug!(query, "rate limited during search, deferring remaining queries");
                    return;
                }
                Err(e) => {
                    warn!(query, error = %e, "search failed");
                    report.errors += 1;
                }
            }
        }
    }
}

fn outcome(expert: &Expert, state: PassState) -> ExpertOutcome {
    ExpertOutcome {
        expert_id: expert.id,
        slug: expert.slug.clone(),
        state,
    }
}

//! Rate-limited social API client.
//!
//! Pure adapter over the upstream REST API: no caching, no internal
//! blocking on 429. A rate limit surfaces as a typed error carrying the
//! wait the reset header implies; the scheduler decides whether to retry
//! in this run or defer to the next one. 5xx responses get a bounded
//! exponential-backoff retry before surfacing as transient failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SocialConfig;
use crate::domain::RawPost;
use crate::error::{CapperError, Result};

/// Upstream per-request cap on batched user lookups. Callers requesting
/// more must chunk themselves so call-count accounting stays exact.
pub const USER_LOOKUP_BATCH_CAP: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SocialUser {
    pub id: String,
    pub username: String,
    pub name: String,
}

/// Seam for the social API so the scheduler is testable with a fake.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Batched user lookup, up to [`USER_LOOKUP_BATCH_CAP`] handles.
    /// Unknown handles are simply absent from the result.
    async fn fetch_users_by_handles(&self, handles: &[String]) -> Result<Vec<SocialUser>>;

    /// Recent original posts from one user's timeline (no retweets/replies)
    async fn fetch_recent_posts(&self, user_id: &str, handle: &str, max: u32)
        -> Result<Vec<RawPost>>;

    /// Recent posts matching a search query
    async fn search_recent_posts(&self, query: &str, max: u32) -> Result<Vec<RawPost>>;
}

// ── Upstream response schemas (fail closed on mismatch) ─────────

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    data: Vec<SocialUser>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<TimelinePost>,
}

#[derive(Debug, Deserialize)]
struct TimelinePost {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchPost>,
    #[serde(default)]
    includes: Option<SearchIncludes>,
}

#[derive(Debug, Deserialize)]
struct SearchPost {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
    author_id: String,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
struct SearchIncludes {
    #[serde(default)]
    users: Vec<SocialUser>,
}

// ── Client ──────────────────────────────────────────────────────

pub struct SocialClient {
    http: Client,
    base_url: String,
    bearer_token: String,
    max_retries: u8,
    backoff_base_ms: u64,
}

impl SocialClient {
    /// Build the client. A missing bearer credential is a configuration
    /// error here, at startup, never per-call.
    pub fn new(cfg: &SocialConfig) -> Result<Self> {
        let bearer_token = cfg
            .bearer_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CapperError::Config("social.bearer_token is required".to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent("capper-social-client/0.1")
            .build()
            .map_err(|e| CapperError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            bearer_token,
            max_retries: cfg.max_retries,
            backoff_base_ms: cfg.backoff_base_ms,
        })
    }

    fn backoff_duration(&self, attempt: u8) -> Duration {
        backoff_with_jitter(self.backoff_base_ms, attempt, &mut rand::thread_rng())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u8 = 0;

        loop {
            let resp = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&self.bearer_token)
                .send()
                .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(CapperError::TransientUpstream(format!(
                            "{url}: {e} (after {attempt} retries)"
                        )));
                    }
                    attempt += 1;
                    let wait = self.backoff_duration(attempt);
                    warn!(%url, attempt, ?wait, "request error, retrying");
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get("x-rate-limit-reset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(|reset| retry_after_from_reset(reset, Utc::now().timestamp()))
                    .unwrap_or(Duration::from_secs(60));
                debug!(%url, ?retry_after, "rate limited");
                return Err(CapperError::RateLimited { retry_after });
            }

            if status.is_server_error() {
                if attempt >= self.max_retries {
                    return Err(CapperError::TransientUpstream(format!(
                        "{url}: {status} (after {attempt} retries)"
                    )));
                }
                attempt += 1;
                let wait = self.backoff_duration(attempt);
                warn!(%url, %status, attempt, ?wait, "upstream error, retrying");
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(CapperError::UpstreamStatus { status: status.as_u16(), body });
            }

            return Ok(resp.json::<T>().await?);
        }
    }
}

#[async_trait]
impl SocialApi for SocialClient {
    async fn fetch_users_by_handles(&self, handles: &[String]) -> Result<Vec<SocialUser>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }
        if handles.len() > USER_LOOKUP_BATCH_CAP {
            return Err(CapperError::Internal(format!(
                "user lookup batch of {} exceeds upstream cap of {USER_LOOKUP_BATCH_CAP}",
                handles.len()
            )));
        }

        let resp: UsersResponse = self
            .get_json("/users/by", &[("usernames", handles.join(","))])
            .await?;
        Ok(resp.data)
    }

    async fn fetch_recent_posts(
        &self,
        user_id: &str,
        handle: &str,
        max: u32,
    ) -> Result<Vec<RawPost>> {
        let resp: TimelineResponse = self
            .get_json(
                &format!("/users/{user_id}/tweets"),
                &[
                    ("max_results", max.clamp(5, 100).to_string()),
                    ("exclude", "retweets,replies".to_string()),
                    ("tweet.fields", "created_at,public_metrics".to_string()),
                ],
            )
            .await?;

        Ok(resp
            .data
            .into_iter()
            .map(|p| RawPost {
                post_id: p.id,
                author_handle: handle.to_string(),
                text: p.text,
                posted_at: p.created_at,
                likes: p.public_metrics.as_ref().map(|m| m.like_count),
                reposts: p.public_metrics.as_ref().map(|m| m.retweet_count),
            })
            .collect())
    }

    async fn search_recent_posts(&self, query: &str, max: u32) -> Result<Vec<RawPost>> {
        let resp: SearchResponse = self
            .get_json(
                "/tweets/search/recent",
                &[
                    ("query", query.to_string()),
                    ("max_results", max.clamp(10, 100).to_string()),
                    ("tweet.fields", "created_at,public_metrics".to_string()),
                    ("expansions", "author_id".to_string()),
                    ("user.fields", "username".to_string()),
                ],
            )
            .await?;

        let users = resp.includes.map(|i| i.users).unwrap_or_default();
        let handle_of = |author_id: &str| {
            users
                .iter()
                .find(|u| u.id == author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default()
        };

        Ok(resp
            .data
            .into_iter()
            .map(|p| RawPost {
                post_id: p.id,
                author_handle: handle_of(&p.author_id),
                text: p.text,
                posted_at: p.created_at,
                likes: p.public_metrics.as_ref().map(|m| m.like_count),
                reposts: p.public_metrics.as_ref().map(|m| m.retweet_count),
            })
            .collect())
    }
}

/// Wait until the advertised reset time, never negative
fn retry_after_from_reset(reset_epoch: i64, now_epoch: i64) -> Duration {
    Duration::from_secs((reset_epoch - now_epoch).max(0) as u64)
}

/// base * 2^(attempt-1), with ±20% jitter
fn backoff_with_jitter<R: Rng>(base_ms: u64, attempt: u8, rng: &mut R) -> Duration {
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1) as u32));
    let factor: f64 = rng.gen_range(0.8..=1.2);
    Duration::from_millis((exp as f64 * factor) as u64)
}

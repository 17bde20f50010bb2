use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched social post. Write-once: created by the social client,
/// retained for audit even when extraction yields nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    /// Source post id, unique per network
    pub post_id: String,
    pub author_handle: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    /// Engagement counters, informational only
    pub likes: Option<i64>,
    pub reposts: Option<i64>,
}

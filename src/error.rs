use std::time::Duration;
use thiserror::Error;

/// Main error type for the pick pipeline
#[derive(Error, Debug)]
pub enum CapperError {
    // Configuration errors (fatal, surfaced before any network call)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned 429. Carries the wait the reset header implies;
    /// the caller decides whether to retry now or defer to the next pass.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Upstream 5xx that survived the bounded retry policy.
    #[error("Transient upstream error: {0}")]
    TransientUpstream(String),

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Grading errors
    #[error("Game unresolved for wager {wager_id}: {reason}")]
    GameUnresolved { wager_id: String, reason: String },

    #[error("Expert not found: {0}")]
    ExpertNotFound(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CapperError {
    /// Recoverable errors are recorded per item in the pass report;
    /// they never abort an enclosing pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CapperError::RateLimited { .. }
                | CapperError::TransientUpstream(_)
                | CapperError::UpstreamStatus { .. }
                | CapperError::GameUnresolved { .. }
        )
    }
}

/// Result type alias for CapperError
pub type Result<T> = std::result::Result<T, CapperError>;

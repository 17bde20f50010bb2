use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::{CapperError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub social: SocialConfig,
    #[serde(default)]
    pub scores: ScoresConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// API server port (default: 8080)
    #[serde(default)]
    pub api_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    /// Bearer credential for the social API. Required before any fetch.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// REST base URL
    #[serde(default = "default_social_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on 5xx
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    /// Base delay for exponential backoff in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_social_base_url() -> String {
    "https://api.x.com/2".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u8 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoresConfig {
    /// Scoreboard base URL (per-sport path is appended)
    #[serde(default = "default_scores_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_scores_base_url() -> String {
    "https://site.api.espn.com/apis/site/v2/sports".to_string()
}

impl Default for ScoresConfig {
    fn default() -> Self {
        Self {
            base_url: default_scores_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Posts to request per expert timeline fetch
    #[serde(default = "default_posts_per_expert")]
    pub posts_per_expert: u32,
    /// Poll interval in seconds by tier, index 0 = tier 1 (least frequent).
    /// Tier 5 polls every run.
    #[serde(default = "default_tier_intervals")]
    pub tier_intervals_secs: Vec<u64>,
    /// Candidates below this confidence are flagged for manual review
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,
    /// Standing search queries for handle-less coverage
    #[serde(default)]
    pub search_queries: Vec<String>,
}

fn default_posts_per_expert() -> u32 {
    20
}

fn default_tier_intervals() -> Vec<u64> {
    // tier 1 daily, tier 5 every run
    vec![86_400, 21_600, 3_600, 900, 0]
}

fn default_low_confidence_threshold() -> f64 {
    0.5
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            posts_per_expert: default_posts_per_expert(),
            tier_intervals_secs: default_tier_intervals(),
            low_confidence_threshold: default_low_confidence_threshold(),
            search_queries: Vec::new(),
        }
    }
}

impl IngestionConfig {
    /// Seconds between polls for a given tier (1..=5). Out-of-range tiers
    /// clamp to the nearest bound.
    pub fn poll_interval_secs(&self, tier: u8) -> u64 {
        let idx = (tier.clamp(1, 5) as usize - 1).min(self.tier_intervals_secs.len() - 1);
        self.tier_intervals_secs[idx]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradingConfig {
    /// Maximum pending wagers to grade per pass
    #[serde(default = "default_grading_batch")]
    pub batch_size: i64,
    /// Passes a wager's game may fail to resolve before the wager is voided
    #[serde(default = "default_max_resolve_attempts")]
    pub max_resolve_attempts: i32,
}

fn default_grading_batch() -> i64 {
    200
}

fn default_max_resolve_attempts() -> i32 {
    5
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_grading_batch(),
            max_resolve_attempts: default_max_resolve_attempts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(
                    std::env::var("CAPPER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (CAPPER_SOCIAL__BEARER_TOKEN, etc.)
            .add_source(
                Environment::with_prefix("CAPPER")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Validate configuration before any network call. A missing bearer
    /// credential is fatal here, never per-call.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        match &self.social.bearer_token {
            None => errors.push("social.bearer_token is required".to_string()),
            Some(t) if t.trim().is_empty() => {
                errors.push("social.bearer_token is empty".to_string())
            }
            Some(_) => {}
        }

        if self.database.url.trim().is_empty() {
            errors.push("database.url is required".to_string());
        }

        if self.ingestion.tier_intervals_secs.is_empty() {
            errors.push("ingestion.tier_intervals_secs must not be empty".to_string());
        }

        let thr = self.ingestion.low_confidence_threshold;
        if !(0.0..=1.0).contains(&thr) {
            errors.push(format!(
                "ingestion.low_confidence_threshold must be in [0, 1], got {thr}"
            ));
        }

        if self.grading.max_resolve_attempts < 1 {
            errors.push("grading.max_resolve_attempts must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CapperError::Config(errors.join("; ")))
        }
    }
}

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod services;

#[cfg(test)]
pub(crate) mod testutil;

pub use adapters::{GameFeed, PostgresStore, ScoresClient, SocialApi, SocialClient, WagerStore};
pub use config::AppConfig;
pub use domain::{
    BetType, Expert, LeaderboardStat, OverUnder, RawPost, Sport, Wager, WagerCandidate,
    WagerResult, WagerStatus,
};
pub use error::{CapperError, Result};
pub use extract::Extractor;
pub use services::{
    CancelFlag, GradingEngine, GradingReport, IngestionReport, IngestionScheduler,
    LeaderboardAggregator,
};

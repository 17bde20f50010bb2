pub mod expert;
pub mod post;
pub mod stats;
pub mod wager;

pub use expert::{Expert, Sport};
pub use post::RawPost;
pub use stats::LeaderboardStat;
pub use wager::{BetType, OverUnder, Wager, WagerCandidate, WagerResult, WagerStatus};

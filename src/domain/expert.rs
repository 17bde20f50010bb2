use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// League a pick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    /// Could not be determined from the post text
    Unknown,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
            Sport::Mlb => "mlb",
            Sport::Nhl => "nhl",
            Sport::Unknown => "unknown",
        }
    }

    /// Scoreboard API path segment, e.g. "football/nfl"
    pub fn feed_path(&self) -> Option<&'static str> {
        match self {
            Sport::Nfl => Some("football/nfl"),
            Sport::Nba => Some("basketball/nba"),
            Sport::Mlb => Some("baseball/mlb"),
            Sport::Nhl => Some("hockey/nhl"),
            Sport::Unknown => None,
        }
    }
}

impl TryFrom<&str> for Sport {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "nfl" => Ok(Sport::Nfl),
            "nba" => Ok(Sport::Nba),
            "mlb" => Ok(Sport::Mlb),
            "nhl" => Ok(Sport::Nhl),
            "unknown" => Ok(Sport::Unknown),
            other => Err(format!("unknown sport: {other}")),
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked betting commentator. Registry rows are administrative data:
/// experts are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expert {
    pub id: i64,
    /// Stable natural key used by the registry file
    pub slug: String,
    pub display_name: String,
    /// Social handle without the leading '@'. Handle-less experts are
    /// tracked but never polled.
    pub handle: Option<String>,
    /// Priority tier 1-5; higher tiers poll more frequently
    pub tier: u8,
    pub specialties: Vec<Sport>,
    /// Source network or show, informational only
    pub network: Option<String>,
    pub active: bool,
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl Expert {
    /// Whether this expert is due for polling at `now`
    pub fn is_due(&self, now: DateTime<Utc>, interval_secs: u64) -> bool {
        match self.last_polled_at {
            None => true,
            Some(last) => (now - last).num_seconds() >= interval_secs as i64,
        }
    }
}

/// Registry file entry (`config/experts.toml`), synced into the store
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default = "default_tier")]
    pub tier: u8,
    #[serde(default)]
    pub specialties: Vec<Sport>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_tier() -> u8 {
    3
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryFile {
    pub experts: Vec<RegistryEntry>,
}

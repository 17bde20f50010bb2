//! Team alias tables for pick extraction.
//!
//! Aliases cover nicknames, common abbreviations, and city+nickname combos.
//! Matching is case-insensitive with longest-match-wins, so "NY Giants"
//! beats "Giants" which beats "NY". Several nicknames are shared across
//! leagues (Giants, Jets, Panthers, Kings, Rangers, Cardinals); the
//! extractor breaks those ties with the expert's declared specialties.

use crate::domain::Sport;

#[derive(Debug, Clone, Copy)]
pub struct TeamAlias {
    pub alias: &'static str,
    pub sport: Sport,
    pub canonical: &'static str,
}

macro_rules! alias {
    ($a:expr, $s:expr, $c:expr) => {
        TeamAlias { alias: $a, sport: $s, canonical: $c }
    };
}

pub const TEAM_ALIASES: &[TeamAlias] = &[
    // ── NFL ─────────────────────────────────────────────────────
    alias!("cardinals", Sport::Nfl, "Arizona Cardinals"),
    alias!("falcons", Sport::Nfl, "Atlanta Falcons"),
    alias!("ravens", Sport::Nfl, "Baltimore Ravens"),
    alias!("bills", Sport::Nfl, "Buffalo Bills"),
    alias!("panthers", Sport::Nfl, "Carolina Panthers"),
    alias!("bears", Sport::Nfl, "Chicago Bears"),
    alias!("bengals", Sport::Nfl, "Cincinnati Bengals"),
    alias!("browns", Sport::Nfl, "Cleveland Browns"),
    alias!("cowboys", Sport::Nfl, "Dallas Cowboys"),
    alias!("broncos", Sport::Nfl, "Denver Broncos"),
    alias!("lions", Sport::Nfl, "Detroit Lions"),
    alias!("packers", Sport::Nfl, "Green Bay Packers"),
    alias!("texans", Sport::Nfl, "Houston Texans"),
    alias!("colts", Sport::Nfl, "Indianapolis Colts"),
    alias!("jaguars", Sport::Nfl, "Jacksonville Jaguars"),
    alias!("jags", Sport::Nfl, "Jacksonville Jaguars"),
    alias!("chiefs", Sport::Nfl, "Kansas City Chiefs"),
    alias!("kc chiefs", Sport::Nfl, "Kansas City Chiefs"),
    alias!("raiders", Sport::Nfl, "Las Vegas Raiders"),
    alias!("chargers", Sport::Nfl, "Los Angeles Chargers"),
    alias!("rams", Sport::Nfl, "Los Angeles Rams"),
    alias!("dolphins", Sport::Nfl, "Miami Dolphins"),
    alias!("vikings", Sport::Nfl, "Minnesota Vikings"),
    alias!("patriots", Sport::Nfl, "New England Patriots"),
    alias!("pats", Sport::Nfl, "New England Patriots"),
    alias!("saints", Sport::Nfl, "New Orleans Saints"),
    alias!("giants", Sport::Nfl, "New York Giants"),
    alias!("ny giants", Sport::Nfl, "New York Giants"),
    alias!("nyg", Sport::Nfl, "New York Giants"),
    alias!("jets", Sport::Nfl, "New York Jets"),
    alias!("ny jets", Sport::Nfl, "New York Jets"),
    alias!("nyj", Sport::Nfl, "New York Jets"),
    alias!("eagles", Sport::Nfl, "Philadelphia Eagles"),
    alias!("steelers", Sport::Nfl, "Pittsburgh Steelers"),
    alias!("49ers", Sport::Nfl, "San Francisco 49ers"),
    alias!("niners", Sport::Nfl, "San Francisco 49ers"),
    alias!("seahawks", Sport::Nfl, "Seattle Seahawks"),
    alias!("buccaneers", Sport::Nfl, "Tampa Bay Buccaneers"),
    alias!("bucs", Sport::Nfl, "Tampa Bay Buccaneers"),
    alias!("titans", Sport::Nfl, "Tennessee Titans"),
    alias!("commanders", Sport::Nfl, "Washington Commanders"),
    // ── NBA ─────────────────────────────────────────────────────
    alias!("hawks", Sport::Nba, "Atlanta Hawks"),
    alias!("celtics", Sport::Nba, "Boston Celtics"),
    alias!("nets", Sport::Nba, "Brooklyn Nets"),
    alias!("hornets", Sport::Nba, "Charlotte Hornets"),
    alias!("bulls", Sport::Nba, "Chicago Bulls"),
    alias!("cavaliers", Sport::Nba, "Cleveland Cavaliers"),
    alias!("cavs", Sport::Nba, "Cleveland Cavaliers"),
    alias!("mavericks", Sport::Nba, "Dallas Mavericks"),
    alias!("mavs", Sport::Nba, "Dallas Mavericks"),
    alias!("nuggets", Sport::Nba, "Denver Nuggets"),
    alias!("pistons", Sport::Nba, "Detroit Pistons"),
    alias!("warriors", Sport::Nba, "Golden State Warriors"),
    alias!("rockets", Sport::Nba, "Houston Rockets"),
    alias!("pacers", Sport::Nba, "Indiana Pacers"),
    alias!("clippers", Sport::Nba, "Los Angeles Clippers"),
    alias!("lakers", Sport::Nba, "Los Angeles Lakers"),
    alias!("grizzlies", Sport::Nba, "Memphis Grizzlies"),
    alias!("heat", Sport::Nba, "Miami Heat"),
    alias!("bucks", Sport::Nba, "Milwaukee Bucks"),
    alias!("timberwolves", Sport::Nba, "Minnesota Timberwolves"),
    alias!("wolves", Sport::Nba, "Minnesota Timberwolves"),
    alias!("pelicans", Sport::Nba, "New Orleans Pelicans"),
    alias!("knicks", Sport::Nba, "New York Knicks"),
    alias!("thunder", Sport::Nba, "Oklahoma City Thunder"),
    alias!("okc", Sport::Nba, "Oklahoma City Thunder"),
    alias!("magic", Sport::Nba, "Orlando Magic"),
    alias!("76ers", Sport::Nba, "Philadelphia 76ers"),
    alias!("sixers", Sport::Nba, "Philadelphia 76ers"),
    alias!("suns", Sport::Nba, "Phoenix Suns"),
    alias!("trail blazers", Sport::Nba, "Portland Trail Blazers"),
    alias!("blazers", Sport::Nba, "Portland Trail Blazers"),
    alias!("kings", Sport::Nba, "Sacramento Kings"),
    alias!("spurs", Sport::Nba, "San Antonio Spurs"),
    alias!("raptors", Sport::Nba, "Toronto Raptors"),
    alias!("jazz", Sport::Nba, "Utah Jazz"),
    alias!("wizards", Sport::Nba, "Washington Wizards"),
    // ── MLB ─────────────────────────────────────────────────────
    alias!("diamondbacks", Sport::Mlb, "Arizona Diamondbacks"),
    alias!("dbacks", Sport::Mlb, "Arizona Diamondbacks"),
    alias!("braves", Sport::Mlb, "Atlanta Braves"),
    alias!("orioles", Sport::Mlb, "Baltimore Orioles"),
    alias!("red sox", Sport::Mlb, "Boston Red Sox"),
    alias!("cubs", Sport::Mlb, "Chicago Cubs"),
    alias!("white sox", Sport::Mlb, "Chicago White Sox"),
    alias!("reds", Sport::Mlb, "Cincinnati Reds"),
    alias!("guardians", Sport::Mlb, "Cleveland Guardians"),
    alias!("rockies", Sport::Mlb, "Colorado Rockies"),
    alias!("tigers", Sport::Mlb, "Detroit Tigers"),
    alias!("astros", Sport::Mlb, "Houston Astros"),
    alias!("royals", Sport::Mlb, "Kansas City Royals"),
    alias!("angels", Sport::Mlb, "Los Angeles Angels"),
    alias!("dodgers", Sport::Mlb, "Los Angeles Dodgers"),
    alias!("marlins", Sport::Mlb, "Miami Marlins"),
    alias!("brewers", Sport::Mlb, "Milwaukee Brewers"),
    alias!("twins", Sport::Mlb, "Minnesota Twins"),
    alias!("mets", Sport::Mlb, "New York Mets"),
    alias!("yankees", Sport::Mlb, "New York Yankees"),
    alias!("athletics", Sport::Mlb, "Oakland Athletics"),
    alias!("phillies", Sport::Mlb, "Philadelphia Phillies"),
    alias!("pirates", Sport::Mlb, "Pittsburgh Pirates"),
    alias!("padres", Sport::Mlb, "San Diego Padres"),
    alias!("giants", Sport::Mlb, "San Francisco Giants"),
    alias!("sf giants", Sport::Mlb, "San Francisco Giants"),
    alias!("mariners", Sport::Mlb, "Seattle Mariners"),
    alias!("cardinals", Sport::Mlb, "St. Louis Cardinals"),
    alias!("rays", Sport::Mlb, "Tampa Bay Rays"),
    alias!("rangers", Sport::Mlb, "Texas Rangers"),
    alias!("blue jays", Sport::Mlb, "Toronto Blue Jays"),
    alias!("nationals", Sport::Mlb, "Washington Nationals"),
    // ── NHL ─────────────────────────────────────────────────────
    alias!("ducks", Sport::Nhl, "Anaheim Ducks"),
    alias!("bruins", Sport::Nhl, "Boston Bruins"),
    alias!("sabres", Sport::Nhl, "Buffalo Sabres"),
    alias!("flames", Sport::Nhl, "Calgary Flames"),
    alias!("hurricanes", Sport::Nhl, "Carolina Hurricanes"),
    alias!("canes", Sport::Nhl, "Carolina Hurricanes"),
    alias!("blackhawks", Sport::Nhl, "Chicago Blackhawks"),
    alias!("avalanche", Sport::Nhl, "Colorado Avalanche"),
    alias!("avs", Sport::Nhl, "Colorado Avalanche"),
    alias!("blue jackets", Sport::Nhl, "Columbus Blue Jackets"),
    alias!("stars", Sport::Nhl, "Dallas Stars"),
    alias!("red wings", Sport::Nhl, "Detroit Red Wings"),
    alias!("oilers", Sport::Nhl, "Edmonton Oilers"),
    alias!("panthers", Sport::Nhl, "Florida Panthers"),
    alias!("kings", Sport::Nhl, "Los Angeles Kings"),
    alias!("la kings", Sport::Nhl, "Los Angeles Kings"),
    alias!("wild", Sport::Nhl, "Minnesota Wild"),
    alias!("canadiens", Sport::Nhl, "Montreal Canadiens"),
    alias!("habs", Sport::Nhl, "Montreal Canadiens"),
    alias!("predators", Sport::Nhl, "Nashville Predators"),
    alias!("preds", Sport::Nhl, "Nashville Predators"),
    alias!("devils", Sport::Nhl, "New Jersey Devils"),
    alias!("islanders", Sport::Nhl, "New York Islanders"),
    alias!("isles", Sport::Nhl, "New York Islanders"),
    alias!("rangers", Sport::Nhl, "New York Rangers"),
    alias!("ny rangers", Sport::Nhl, "New York Rangers"),
    alias!("senators", Sport::Nhl, "Ottawa Senators"),
    alias!("sens", Sport::Nhl, "Ottawa Senators"),
    alias!("flyers", Sport::Nhl, "Philadelphia Flyers"),
    alias!("penguins", Sport::Nhl, "Pittsburgh Penguins"),
    alias!("pens", Sport::Nhl, "Pittsburgh Penguins"),
    alias!("sharks", Sport::Nhl, "San Jose Sharks"),
    alias!("kraken", Sport::Nhl, "Seattle Kraken"),
    alias!("blues", Sport::Nhl, "St. Louis Blues"),
    alias!("lightning", Sport::Nhl, "Tampa Bay Lightning"),
    alias!("bolts", Sport::Nhl, "Tampa Bay Lightning"),
    alias!("maple leafs", Sport::Nhl, "Toronto Maple Leafs"),
    alias!("leafs", Sport::Nhl, "Toronto Maple Leafs"),
    alias!("canucks", Sport::Nhl, "Vancouver Canucks"),
    alias!("golden knights", Sport::Nhl, "Vegas Golden Knights"),
    alias!("capitals", Sport::Nhl, "Washington Capitals"),
    alias!("caps", Sport::Nhl, "Washington Capitals"),
    alias!("jets", Sport::Nhl, "Winnipeg Jets"),
];

/// One team mention found in post text. `interpretations` holds every
/// (sport, canonical) pair the matched alias could mean.
#[derive(Debug, Clone)]
pub struct TeamMatch {
    /// Byte offset into the lowercased text
    pub start: usize,
    pub len: usize,
    pub alias: &'static str,
    pub interpretations: Vec<&'static TeamAlias>,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Scan lowercased text for team aliases, longest match wins at each
/// position. Matches never overlap; scanning resumes past each match.
pub fn find_teams(lower: &str) -> Vec<TeamMatch> {
    let bytes = lower.as_bytes();
    let mut out: Vec<TeamMatch> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        // only attempt matches at word starts
        if is_word_byte(bytes[i]) && (i == 0 || !is_word_byte(bytes[i - 1])) {
            let rest = &lower[i..];
            let mut best: Option<(&'static str, usize)> = None;
            for a in TEAM_ALIASES {
                if rest.starts_with(a.alias) {
                    let end = i + a.alias.len();
                    let bounded = end >= bytes.len() || !is_word_byte(bytes[end]);
                    if bounded && best.map_or(true, |(_, l)| a.alias.len() > l) {
                        best = Some((a.alias, a.alias.len()));
                    }
                }
            }
            if let Some((alias, len)) = best {
                let interpretations: Vec<&'static TeamAlias> =
                    TEAM_ALIASES.iter().filter(|a| a.alias == alias).collect();
                out.push(TeamMatch { start: i, len, alias, interpretations });
                i += len;
                continue;
            }
        }
        i += 1;
    }
    out
}

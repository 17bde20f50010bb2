//! Heuristic pick extraction: free-text post -> structured wager candidates.
//!
//! Pure functions over text. Ambiguity is data (the confidence score and
//! `low_confidence` flag), never an error: a post that cannot be read
//! cleanly yields low-confidence candidates or nothing at all.

pub mod teams;

use rust_decimal::Decimal;

use crate::domain::{BetType, OverUnder, RawPost, Sport, WagerCandidate};
use teams::{find_teams, TeamMatch};

pub struct Extractor {
    low_confidence_threshold: f64,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Extractor {
    pub fn new(low_confidence_threshold: f64) -> Self {
        Self { low_confidence_threshold }
    }

    /// Extract 0..N wager candidates from one post. `specialties` are the
    /// posting expert's declared sports, used only to break cross-sport
    /// nickname ties.
    pub fn extract(&self, post: &RawPost, specialties: &[Sport]) -> Vec<WagerCandidate> {
        let lower = post.text.to_lowercase();
        let mentions = find_teams(&lower);
        if mentions.is_empty() {
            return Vec::new();
        }

        // Each team mention starts a new selection; its span runs to the
        // next mention (parlay-style posts yield one candidate per span).
        let mut candidates = Vec::with_capacity(mentions.len());
        for (k, mention) in mentions.iter().enumerate() {
            let span_start = mention.start + mention.len;
            let span_end = mentions.get(k + 1).map_or(lower.len(), |m| m.start);
            let facts = scan_span(&lower[span_start..span_end]);
            candidates.push(self.build_candidate(post, mention, facts, specialties));
        }
        candidates
    }

    fn build_candidate(
        &self,
        post: &RawPost,
        mention: &TeamMatch,
        facts: SpanFacts,
        specialties: &[Sport],
    ) -> WagerCandidate {
        let (sport, team, team_credit, forced_low) = resolve_team(mention, specialties);

        let (bet_type, line, side, marker_found) = if let (Some(side), Some(line)) =
            (facts.total_side, facts.total_line)
        {
            (BetType::Total, Some(line), Some(side), true)
        } else if let Some(line) = facts.spread_line {
            (BetType::Spread, Some(line), None, true)
        } else if facts.ml_marker || facts.odds.is_some() {
            // "ML" marker, or a bare signed odds-magnitude number with no line
            (BetType::Moneyline, None, None, true)
        } else {
            // team mention with nothing around it; emit rather than guess a line
            (BetType::Moneyline, None, None, false)
        };

        let mut confidence = team_credit;
        if marker_found {
            confidence += 0.3;
        }
        // For a moneyline the price is the line; credit it as such.
        if line.is_some() || (bet_type == BetType::Moneyline && marker_found && facts.odds.is_some())
        {
            confidence += 0.2;
        }
        if facts.odds.is_some() {
            confidence += 0.1;
        }
        let confidence = confidence.min(1.0);

        WagerCandidate {
            sport,
            team,
            bet_type,
            line,
            side,
            odds: facts.odds,
            units: facts.units,
            confidence,
            low_confidence: forced_low || confidence < self.low_confidence_threshold,
            source_post_id: post.post_id.clone(),
        }
    }
}

/// Resolve a team mention to (sport, canonical name, confidence credit,
/// forced-low flag). Cross-sport nicknames fall back to the expert's
/// specialties; still-ambiguous mentions keep sport = unknown rather
/// than guessing.
fn resolve_team(
    mention: &TeamMatch,
    specialties: &[Sport],
) -> (Sport, String, f64, bool) {
    match mention.interpretations.as_slice() {
        [only] => (only.sport, only.canonical.to_string(), 0.4, false),
        many => {
            let narrowed: Vec<_> = many
                .iter()
                .filter(|a| specialties.contains(&a.sport))
                .collect();
            if let [only] = narrowed.as_slice() {
                (only.sport, only.canonical.to_string(), 0.25, false)
            } else {
                (Sport::Unknown, mention.alias.to_string(), 0.15, true)
            }
        }
    }
}

/// Everything numeric/markered found in the text trailing one team mention
#[derive(Debug, Default)]
struct SpanFacts {
    spread_line: Option<Decimal>,
    total_side: Option<OverUnder>,
    total_line: Option<Decimal>,
    ml_marker: bool,
    odds: Option<i32>,
    units: Option<Decimal>,
}

fn scan_span(span: &str) -> SpanFacts {
    let mut facts = SpanFacts::default();
    let mut pending_total: Option<OverUnder> = None;
    let mut last_number: Option<Decimal> = None;

    for raw in span.split_whitespace() {
        let parenthesized = raw.contains('(') || raw.contains(')');
        let tok = raw
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '+' && c != '-' && c != '.')
            .trim_end_matches('.');
        if tok.is_empty() {
            continue;
        }

        match tok {
            "ml" | "moneyline" => {
                facts.ml_marker = true;
                continue;
            }
            "over" | "o" => {
                pending_total = Some(OverUnder::Over);
                continue;
            }
            "under" | "u" => {
                pending_total = Some(OverUnder::Under);
                continue;
            }
            "unit" | "units" => {
                if facts.units.is_none() {
                    facts.units = last_number.take();
                }
                continue;
            }
            _ => {}
        }

        // combined over/under tokens: "o47.5", "u215"
        if let Some(rest) = tok.strip_prefix('o').filter(|r| parses_decimal(r)) {
            facts.total_side = Some(OverUnder::Over);
            facts.total_line = rest.parse().ok();
            continue;
        }
        if let Some(rest) = tok.strip_prefix('u').filter(|r| parses_decimal(r)) {
            facts.total_side = Some(OverUnder::Under);
            facts.total_line = rest.parse().ok();
            continue;
        }
        // unit sizing: "2u", "1.5u"
        if let Some(prefix) = tok.strip_suffix('u').filter(|p| parses_decimal(p)) {
            if facts.units.is_none() {
                facts.units = prefix.parse().ok();
            }
            continue;
        }

        if let Some(num) = parse_number(tok) {
            if let Some(side) = pending_total.take() {
                facts.total_side = Some(side);
                facts.total_line = Some(num.value);
                continue;
            }
            last_number = Some(num.value);

            let abs_int = num.integer_abs();
            let odds_magnitude = abs_int.is_some_and(|v| (100..=10_000).contains(&v));

            if odds_magnitude && (num.signed || parenthesized) {
                // odds trail the selection; keep the latest qualifying number
                facts.odds = num.value.try_into().ok().map(|v: i64| v as i32);
            } else if num.signed && abs_int.map_or(true, |v| v < 100) {
                if facts.spread_line.is_none() {
                    facts.spread_line = Some(num.value);
                }
            }
            // unsigned small numbers (scores, dates, record strings) are noise
        }
    }

    facts
}

struct ParsedNumber {
    value: Decimal,
    signed: bool,
    has_fraction: bool,
}

impl ParsedNumber {
    /// Absolute integral value when the number has no fractional part
    fn integer_abs(&self) -> Option<i64> {
        if self.has_fraction {
            None
        } else {
            i64::try_from(self.value.abs().trunc().mantissa()).ok()
        }
    }
}

fn parses_decimal(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.') && s.parse::<Decimal>().is_ok()
}

fn parse_number(tok: &str) -> Option<ParsedNumber> {
    let signed = tok.starts_with('+') || tok.starts_with('-');
    let digits = tok.trim_start_matches(['+', '-']);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: Decimal = tok.parse().ok()?;
    Some(ParsedNumber {
        value,
        signed,
        has_fraction: digits.contains('.') && !digits.ends_with('.'),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn post(text: &str) -> RawPost {
        RawPost {
            post_id: "1001".into(),
            author_handle: "locklarry".into(),
            text: text.into(),
            posted_at: Utc::now(),
            likes: None,
            reposts: None,
        }
    }

    fn extract(text: &str, specialties: &[Sport]) -> Vec<WagerCandidate> {
        Extractor::default().extract(&post(text), specialties)
    }

    #[test]
    fn test_clean_spread_pick() {
        let c = extract("Chiefs -3.5 (-110)", &[Sport::Nfl]);
        assert_eq!(c.len(), 1);
        let c = &c[0];
        assert_eq!(c.team, "Kansas City Chiefs");
        assert_eq!(c.sport, Sport::Nfl);
        assert_eq!(c.bet_type, BetType::Spread);
        assert_eq!(c.line, Some(dec!(-3.5)));
        assert_eq!(c.odds, Some(-110));
        assert!(c.confidence >= 0.9);
        assert!(!c.low_confidence);
    }

    #[test]
    fn test_vague_post_is_low_confidence() {
        let c = extract("love the Chiefs tonight", &[Sport::Nfl]);
        assert!(c.len() <= 1);
        if let Some(c) = c.first() {
            assert!(c.low_confidence);
            assert!(c.line.is_none());
            assert!(c.odds.is_none());
        }
    }

    #[test]
    fn test_moneyline_with_marker() {
        let c = extract("Lakers ML -120 tonight, 2u", &[Sport::Nba]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].bet_type, BetType::Moneyline);
        assert_eq!(c[0].odds, Some(-120));
        assert_eq!(c[0].units, Some(dec!(2)));
        assert!(!c[0].low_confidence);
    }

    #[test]
    fn test_bare_plus_odds_is_moneyline() {
        let c = extract("Bills +150", &[Sport::Nfl]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].bet_type, BetType::Moneyline);
        assert_eq!(c[0].line, None);
        assert_eq!(c[0].odds, Some(150));
    }

    #[test]
    fn test_total_over() {
        let c = extract("Chiefs over 47.5 (-105)", &[Sport::Nfl]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].bet_type, BetType::Total);
        assert_eq!(c[0].side, Some(OverUnder::Over));
        assert_eq!(c[0].line, Some(dec!(47.5)));
        assert_eq!(c[0].odds, Some(-105));
    }

    #[test]
    fn test_total_combined_token() {
        let c = extract("Celtics u215 -110", &[Sport::Nba]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].bet_type, BetType::Total);
        assert_eq!(c[0].side, Some(OverUnder::Under));
        assert_eq!(c[0].line, Some(dec!(215)));
    }

    #[test]
    fn test_parlay_yields_one_candidate_per_leg() {
        let c = extract(
            "Tonight's card:\nChiefs -3.5 (-110)\nLakers ML (-140)\nBruins +1.5",
            &[Sport::Nfl, Sport::Nba, Sport::Nhl],
        );
        assert_eq!(c.len(), 3);
        assert_eq!(c[0].bet_type, BetType::Spread);
        assert_eq!(c[1].bet_type, BetType::Moneyline);
        assert_eq!(c[2].bet_type, BetType::Spread);
        assert_eq!(c[2].line, Some(dec!(1.5)));
    }

    #[test]
    fn test_shared_nickname_resolved_by_specialty() {
        let c = extract("Giants -2.5", &[Sport::Mlb]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].sport, Sport::Mlb);
        assert_eq!(c[0].team, "San Francisco Giants");
    }

    #[test]
    fn test_shared_nickname_unresolved_stays_unknown() {
        // expert covers both leagues that use the nickname
        let c = extract("Rangers ML", &[Sport::Mlb, Sport::Nhl]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].sport, Sport::Unknown);
        assert!(c[0].low_confidence);
    }

    #[test]
    fn test_no_team_no_candidates() {
        assert!(extract("hammer the over tonight", &[Sport::Nfl]).is_empty());
    }

    #[test]
    fn test_unsigned_numbers_are_noise() {
        // record mentions and years must not become lines or odds
        let c = extract("Chiefs are 12 and 4 since 2023, love them ML -115", &[Sport::Nfl]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].bet_type, BetType::Moneyline);
        assert_eq!(c[0].odds, Some(-115));
        assert_eq!(c[0].line, None);
    }
}

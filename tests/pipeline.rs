//! End-to-end exercises of the public pipeline surface: post text in,
//! graded result out, with no store or network involved.

use capper::adapters::GameResult;
use capper::domain::wager::DEFAULT_ODDS;
use capper::services::grading::settle;
use capper::{BetType, Extractor, OverUnder, RawPost, Sport, Wager, WagerResult};
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

fn post(text: &str) -> RawPost {
    RawPost {
        post_id: "9001".into(),
        author_handle: "locklarry".into(),
        text: text.into(),
        posted_at: Utc.with_ymd_and_hms(2024, 11, 3, 16, 30, 0).unwrap(),
        likes: Some(42),
        reposts: Some(7),
    }
}

fn game(home: &str, away: &str, hs: i32, aws: i32) -> GameResult {
    GameResult {
        game_id: "401547439".into(),
        home_team: home.into(),
        away_team: away.into(),
        home_score: hs,
        away_score: aws,
    }
}

#[test]
fn spread_pick_extracts_promotes_and_settles() {
    let p = post("Chiefs -3.5 (-110), best bet of the week");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    assert_eq!(candidates.len(), 1);

    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);
    assert_eq!(wager.expert_id, 7);
    assert_eq!(wager.game_date, p.posted_at.date_naive());
    assert_eq!(wager.odds, -110);
    assert_eq!(wager.units, dec!(1));

    // wins by 4: covers the 3.5
    let result = settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 28, 24));
    assert_eq!(result, Some(WagerResult::Win));

    // wins by 3: does not
    let result = settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 27, 24));
    assert_eq!(result, Some(WagerResult::Loss));
}

#[test]
fn total_pick_settles_both_directions_and_push() {
    let p = post("Chiefs game over 47.5 tonight");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].bet_type, BetType::Total);
    assert_eq!(candidates[0].side, Some(OverUnder::Over));

    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);
    assert_eq!(
        settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 28, 24)),
        Some(WagerResult::Win)
    );
    assert_eq!(
        settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 23, 24)),
        Some(WagerResult::Loss)
    );

    let p = post("Chiefs under 52");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);
    assert_eq!(
        settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 28, 24)),
        Some(WagerResult::Push)
    );
}

#[test]
fn moneyline_pick_ignores_the_margin() {
    let p = post("Bills ML +150, live dog");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].bet_type, BetType::Moneyline);

    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);
    assert_eq!(wager.odds, 150);
    assert_eq!(
        settle(&wager, &game("Kansas City Chiefs", "Buffalo Bills", 24, 27)),
        Some(WagerResult::Win)
    );
    assert_eq!(wager.net_units(), dec!(0));
    let mut graded = wager.clone();
    graded.result = Some(WagerResult::Win);
    assert_eq!(graded.net_units(), dec!(1.5));
}

#[test]
fn settle_requires_the_team_in_the_game() {
    let p = post("Chiefs -3.5");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);

    let other_game = game("Dallas Cowboys", "Philadelphia Eagles", 21, 17);
    assert_eq!(settle(&wager, &other_game), None);
}

#[test]
fn priceless_pick_carries_standard_juice() {
    let p = post("Chiefs -7 tonight");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl]);
    assert_eq!(candidates[0].odds, None);

    let wager = Wager::from_candidate(7, &candidates[0], p.posted_at);
    assert_eq!(wager.odds, DEFAULT_ODDS);
}

#[test]
fn multi_leg_post_settles_each_leg_independently() {
    let p = post("Saturday card: Chiefs -3.5 (-110) and Celtics ML -200, 2u each");
    let candidates = Extractor::default().extract(&p, &[Sport::Nfl, Sport::Nba]);
    assert_eq!(candidates.len(), 2);

    let nfl = Wager::from_candidate(7, &candidates[0], p.posted_at);
    let nba = Wager::from_candidate(7, &candidates[1], p.posted_at);
    assert_eq!(nfl.sport, Sport::Nfl);
    assert_eq!(nba.sport, Sport::Nba);

    assert_eq!(
        settle(&nfl, &game("Kansas City Chiefs", "Buffalo Bills", 27, 24)),
        Some(WagerResult::Loss)
    );
    assert_eq!(
        settle(&nba, &game("Boston Celtics", "Miami Heat", 110, 104)),
        Some(WagerResult::Win)
    );
}

// tests/normalize_esports.rs
use std::fs;

use event_scout::aggregate::sources::esports::normalize_match;
use event_scout::EventType;

fn fixture_matches() -> Vec<serde_json::Value> {
    serde_json::from_str(
        &fs::read_to_string("tests/fixtures/pandascore_matches.json").expect("fixture"),
    )
    .expect("fixture json")
}

#[test]
fn normalizes_a_full_upstream_match() {
    let matches = fixture_matches();
    let ev = normalize_match(&matches[0]).expect("normalize");

    assert_eq!(ev.external_id, "pandascore_812345");
    assert_eq!(ev.title, "Grand Final: G2 vs T1");
    assert_eq!(ev.description, "G2 Esports vs T1");
    assert_eq!(ev.event_type, EventType::Esports);
    assert_eq!(ev.category, "lol");
    assert_eq!(ev.venue_name, "LEC Summer Playoffs");
    assert_eq!(ev.source, "pandascore");
    assert_eq!(ev.price, None);
    assert_eq!(
        ev.registration_url.as_deref(),
        Some("https://twitch.tv/lec")
    );

    // The upstream publishes no venue coordinates: flagged, not (0,0).
    assert!(ev.location.is_none());
}

#[test]
fn falls_back_to_league_name_begin_at_and_live_url() {
    let matches = fixture_matches();
    let ev = normalize_match(&matches[1]).expect("normalize");

    assert_eq!(ev.title, "ESL Pro League");
    assert_eq!(ev.category, "counter-strike");
    assert_eq!(ev.venue_name, "Online");
    assert_eq!(ev.description, "");
    assert_eq!(
        ev.registration_url.as_deref(),
        Some("https://twitch.tv/esl")
    );
    assert_eq!(ev.start_time.to_rfc3339(), "2026-09-21T12:30:00+00:00");
}

#[test]
fn match_without_any_start_time_is_rejected() {
    let matches = fixture_matches();
    assert!(normalize_match(&matches[2]).is_err());
}

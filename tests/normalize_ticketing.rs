// tests/normalize_ticketing.rs
use chrono::{Datelike, Timelike};
use rust_decimal_macros::dec;
use std::fs;

use event_scout::aggregate::sources::ticketing::normalize_event;
use event_scout::EventType;

fn fixture_events() -> Vec<serde_json::Value> {
    let body: serde_json::Value =
        serde_json::from_str(&fs::read_to_string("tests/fixtures/seatgeek_events.json").expect("fixture"))
            .expect("fixture json");
    body["events"].as_array().expect("events array").clone()
}

#[test]
fn normalizes_a_full_upstream_event() {
    let events = fixture_events();
    let ev = normalize_event(&events[0]).expect("normalize");

    assert_eq!(ev.external_id, "seatgeek_6215301");
    assert_eq!(ev.title, "Binghamton Bearcats vs. UMBC Retrievers");
    assert_eq!(ev.event_type, EventType::Sports);
    assert_eq!(ev.category, "basketball");
    assert_eq!(ev.source, "seatgeek");
    assert_eq!(ev.price, Some(dec!(25)));
    assert_eq!(ev.venue_name, "Events Center");

    let loc = ev.location.expect("venue coordinates");
    assert!((loc.lat - 42.0897).abs() < 1e-9);
    assert!((loc.lng - (-75.9679)).abs() < 1e-9);

    // Naive upstream timestamps are read as UTC.
    assert_eq!(ev.start_time.year(), 2026);
    assert_eq!(ev.start_time.hour(), 23);

    // The upstream payload rides along for auditing.
    assert_eq!(ev.raw_data["id"], 6215301);
}

#[test]
fn missing_price_means_unknown_not_zero() {
    let events = fixture_events();
    let ev = normalize_event(&events[1]).expect("normalize");

    assert_eq!(ev.price, None);
    // Category tags are lower-cased on the way in.
    assert_eq!(ev.category, "milb");
    assert_eq!(ev.description, "Minor league baseball");
}

#[test]
fn event_without_start_time_is_rejected() {
    let events = fixture_events();
    assert!(normalize_event(&events[2]).is_err());
}

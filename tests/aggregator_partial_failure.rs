// tests/aggregator_partial_failure.rs
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;

use event_scout::{Aggregator, CanonicalEvent, EventSource, EventType, FetchOptions, GeoPoint};

fn event(external_id: &str, source: &str) -> CanonicalEvent {
    CanonicalEvent {
        external_id: external_id.to_string(),
        title: "Sample".to_string(),
        description: String::new(),
        event_type: EventType::Sports,
        category: "basketball".to_string(),
        location: Some(GeoPoint::new(42.0, -75.0)),
        venue_name: "Gym".to_string(),
        start_time: Utc::now() + Duration::days(1),
        end_time: None,
        price: None,
        registration_url: None,
        source: source.to_string(),
        raw_data: json!({}),
    }
}

struct StaticSource {
    name: &'static str,
    events: Vec<CanonicalEvent>,
}

#[async_trait::async_trait]
impl EventSource for StaticSource {
    async fn fetch_events(
        &self,
        _location: GeoPoint,
        _radius_miles: f64,
        _tags: &[String],
    ) -> Result<Vec<CanonicalEvent>> {
        Ok(self.events.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

struct FailingSource;

#[async_trait::async_trait]
impl EventSource for FailingSource {
    async fn fetch_events(
        &self,
        _location: GeoPoint,
        _radius_miles: f64,
        _tags: &[String],
    ) -> Result<Vec<CanonicalEvent>> {
        anyhow::bail!("upstream returned 503")
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn origin() -> GeoPoint {
    GeoPoint::new(42.0987, -75.9179)
}

#[tokio::test]
async fn one_failing_source_does_not_poison_the_rest() {
    let ticketing = StaticSource {
        name: "ticketing",
        events: vec![event("a_1", "ticketing"), event("a_2", "ticketing")],
    };
    let scraper = StaticSource {
        name: "scraper",
        events: vec![event("b_1", "scraper")],
    };

    let agg = Aggregator::new(
        Some(Arc::new(ticketing)),
        Some(Arc::new(FailingSource)),
        Some(Arc::new(scraper)),
    );

    let events = agg
        .fetch_events(origin(), 50.0, &FetchOptions::default())
        .await;

    let mut ids: Vec<&str> = events.iter().map(|e| e.external_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a_1", "a_2", "b_1"]);
}

#[tokio::test]
async fn all_sources_failing_yields_an_empty_list() {
    let agg = Aggregator::new(
        Some(Arc::new(FailingSource)),
        Some(Arc::new(FailingSource)),
        None,
    );

    let events = agg
        .fetch_events(origin(), 50.0, &FetchOptions::default())
        .await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn options_gate_the_esports_and_scraper_slots() {
    let esports = StaticSource {
        name: "esports",
        events: vec![event("e_1", "esports")],
    };
    let scraper = StaticSource {
        name: "scraper",
        events: vec![event("s_1", "scraper")],
    };

    let agg = Aggregator::new(None, Some(Arc::new(esports)), Some(Arc::new(scraper)));

    let opts = FetchOptions {
        include_esports: false,
        ..Default::default()
    };
    let events = agg.fetch_events(origin(), 50.0, &opts).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].external_id, "s_1");

    let opts = FetchOptions {
        use_scraper: false,
        ..Default::default()
    };
    let events = agg.fetch_events(origin(), 50.0, &opts).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].external_id, "e_1");
}

#[tokio::test]
async fn disabled_slots_contribute_nothing() {
    let agg = Aggregator::new(None, None, None);
    let events = agg
        .fetch_events(origin(), 50.0, &FetchOptions::default())
        .await;
    assert!(events.is_empty());
    assert!(agg.enabled_sources().is_empty());
}

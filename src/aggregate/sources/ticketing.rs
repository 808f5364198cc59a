//! Ticketing source: a SeatGeek-shaped events search API.
//!
//! The upstream supports geo search directly, so the caller's lat/lng/radius
//! are forwarded as query parameters. Responses are normalized at this
//! boundary; the rest of the pipeline never sees the upstream shape.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::types::{CanonicalEvent, EventSource, EventType};
use crate::cache::CacheGate;
use crate::geo::GeoPoint;

const DEFAULT_BASE_URL: &str = "https://api.seatgeek.com/2";
const CACHE_TTL_SECS: u64 = 1800; // 30 minutes
const PER_PAGE: u32 = 50;

#[derive(Debug, Clone)]
pub struct TicketingCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

pub struct TicketingSource {
    base_url: String,
    credentials: TicketingCredentials,
    http: reqwest::Client,
    cache: Arc<CacheGate>,
}

/// Cache key parameters. Field order is the canonical serialization order.
#[derive(Serialize)]
struct CacheParams<'a> {
    lat: f64,
    lng: f64,
    radius: f64,
    categories: &'a [String],
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct UpstreamEvent {
    id: u64,
    title: String,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    datetime_utc: Option<String>,
    url: Option<String>,
    stats: Option<UpstreamStats>,
    venue: Option<UpstreamVenue>,
}

#[derive(Deserialize)]
struct UpstreamStats {
    lowest_price: Option<Decimal>,
}

#[derive(Deserialize)]
struct UpstreamVenue {
    name: Option<String>,
    location: Option<UpstreamVenueLocation>,
}

#[derive(Deserialize)]
struct UpstreamVenueLocation {
    lat: f64,
    lon: f64,
}

impl TicketingSource {
    pub fn new(
        credentials: TicketingCredentials,
        http: reqwest::Client,
        cache: Arc<CacheGate>,
    ) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            http,
            cache,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_upstream(
        &self,
        location: GeoPoint,
        radius_miles: f64,
        categories: &[String],
    ) -> Result<Vec<CanonicalEvent>> {
        let t0 = std::time::Instant::now();

        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.credentials.client_id.clone()),
            ("lat", location.lat.to_string()),
            ("lon", location.lng.to_string()),
            ("range", format!("{radius_miles}mi")),
            ("per_page", PER_PAGE.to_string()),
            ("datetime_utc.gte", Utc::now().to_rfc3339()),
        ];
        if let Some(secret) = &self.credentials.client_secret {
            params.push(("client_secret", secret.clone()));
        }
        if !categories.is_empty() {
            params.push(("taxonomies_name", categories.join(",")));
        }

        let resp = self
            .http
            .get(format!("{}/events", self.base_url))
            .query(&params)
            .send()
            .await
            .context("ticketing http get")?
            .error_for_status()
            .context("ticketing http status")?;

        let body: SearchResponse = resp.json().await.context("ticketing response json")?;

        let mut out = Vec::with_capacity(body.events.len());
        for raw in &body.events {
            match normalize_event(raw) {
                Ok(ev) => out.push(ev),
                Err(e) => {
                    tracing::warn!(error = ?e, source = "seatgeek", "skipping malformed upstream event");
                }
            }
        }

        histogram!("source_fetch_ms", "source" => "seatgeek")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("aggregate_events_total", "source" => "seatgeek").increment(out.len() as u64);
        Ok(out)
    }
}

/// Map one upstream record into the canonical shape. `start_time` is
/// required; records without it are rejected here and skipped by the caller.
pub fn normalize_event(raw: &serde_json::Value) -> Result<CanonicalEvent> {
    let ev: UpstreamEvent =
        serde_json::from_value(raw.clone()).context("decoding ticketing event")?;

    let start = ev
        .datetime_utc
        .as_deref()
        .context("event missing datetime_utc")?;
    let start_time = parse_event_time(start)?;

    let venue = ev.venue.as_ref();
    let location = venue
        .and_then(|v| v.location.as_ref())
        .map(|l| GeoPoint::new(l.lat, l.lon));

    Ok(CanonicalEvent {
        external_id: format!("seatgeek_{}", ev.id),
        title: ev.title,
        description: ev.description.unwrap_or_default(),
        event_type: EventType::Sports,
        category: ev.kind.unwrap_or_else(|| "sports".to_string()).to_lowercase(),
        location,
        venue_name: venue
            .and_then(|v| v.name.clone())
            .unwrap_or_default(),
        start_time,
        end_time: None,
        // Cheapest listed price, or unknown when the upstream lists none.
        price: ev.stats.and_then(|s| s.lowest_price),
        registration_url: ev.url,
        source: "seatgeek".to_string(),
        raw_data: raw.clone(),
    })
}

/// The upstream emits either RFC3339 or a naive UTC timestamp.
fn parse_event_time(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("unparseable event time: {s}"))?;
    Ok(naive.and_utc())
}

#[async_trait]
impl EventSource for TicketingSource {
    async fn fetch_events(
        &self,
        location: GeoPoint,
        radius_miles: f64,
        tags: &[String],
    ) -> Result<Vec<CanonicalEvent>> {
        let key = CacheGate::api_key(
            "seatgeek",
            &CacheParams {
                lat: location.lat,
                lng: location.lng,
                radius: radius_miles,
                categories: tags,
            },
        );

        if let Some(cached) = self.cache.get_json::<Vec<CanonicalEvent>>(&key).await {
            tracing::debug!(source = "seatgeek", "returning cached events");
            return Ok(cached);
        }

        let events = self.fetch_upstream(location, radius_miles, tags).await?;
        self.cache.set_json(&key, &events, CACHE_TTL_SECS).await;
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "seatgeek"
    }
}

//! Esports source: a PandaScore-shaped match API.
//!
//! The upstream has no geo dimension, so the caller's location is ignored at
//! fetch time and results are cached per game set rather than per location.
//! Matches carry no venue coordinates either; normalized records are
//! location-unknown (`location: None`) instead of pretending to be at (0,0).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::types::{CanonicalEvent, EventSource, EventType};
use crate::cache::CacheGate;
use crate::geo::GeoPoint;

const DEFAULT_BASE_URL: &str = "https://api.pandascore.co";
const CACHE_TTL_SECS: u64 = 3600; // 1 hour
const PER_PAGE: u32 = 50;

/// Queried when the caller names no games.
const DEFAULT_GAMES: [&str; 4] = ["lol", "csgo", "dota2", "valorant"];

pub struct EsportsSource {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
    cache: Arc<CacheGate>,
}

#[derive(Serialize)]
struct CacheParams<'a> {
    games: &'a [String],
}

#[derive(Deserialize)]
struct UpstreamMatch {
    id: u64,
    name: Option<String>,
    league: Option<UpstreamNamed>,
    videogame: Option<UpstreamNamed>,
    tournament: Option<UpstreamNamed>,
    #[serde(default)]
    opponents: Vec<UpstreamOpponentSlot>,
    scheduled_at: Option<String>,
    begin_at: Option<String>,
    official_stream_url: Option<String>,
    live_url: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamNamed {
    name: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamOpponentSlot {
    opponent: Option<UpstreamNamed>,
}

impl EsportsSource {
    pub fn new(api_key: String, http: reqwest::Client, cache: Arc<CacheGate>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            http,
            cache,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_game(&self, game: &str) -> Result<Vec<CanonicalEvent>> {
        let t0 = std::time::Instant::now();

        let params: Vec<(&str, String)> = vec![
            ("token", self.api_key.clone()),
            ("page", "1".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("filter", "upcoming".to_string()),
        ];

        let resp = self
            .http
            .get(format!("{}/{game}/matches/upcoming", self.base_url))
            .query(&params)
            .send()
            .await
            .with_context(|| format!("esports http get ({game})"))?
            .error_for_status()
            .with_context(|| format!("esports http status ({game})"))?;

        let matches: Vec<serde_json::Value> =
            resp.json().await.with_context(|| format!("esports response json ({game})"))?;

        let mut out = Vec::with_capacity(matches.len());
        for raw in &matches {
            match normalize_match(raw) {
                Ok(ev) => out.push(ev),
                Err(e) => {
                    tracing::warn!(error = ?e, source = "pandascore", game = %game, "skipping malformed upstream match");
                }
            }
        }

        histogram!("source_fetch_ms", "source" => "pandascore")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

/// Map one upstream match into the canonical shape.
pub fn normalize_match(raw: &serde_json::Value) -> Result<CanonicalEvent> {
    let m: UpstreamMatch = serde_json::from_value(raw.clone()).context("decoding esports match")?;

    let start = m
        .scheduled_at
        .as_deref()
        .or(m.begin_at.as_deref())
        .context("match missing scheduled_at/begin_at")?;
    let start_time = DateTime::parse_from_rfc3339(start)
        .with_context(|| format!("unparseable match time: {start}"))?
        .with_timezone(&Utc);

    let title = m
        .name
        .or_else(|| m.league.as_ref().and_then(|l| l.name.clone()))
        .unwrap_or_else(|| "Tournament Match".to_string());

    let description = m
        .opponents
        .iter()
        .filter_map(|o| o.opponent.as_ref().and_then(|n| n.name.clone()))
        .collect::<Vec<_>>()
        .join(" vs ");

    Ok(CanonicalEvent {
        external_id: format!("pandascore_{}", m.id),
        title,
        description,
        event_type: EventType::Esports,
        category: m
            .videogame
            .and_then(|v| v.name)
            .map(|n| n.to_lowercase())
            .unwrap_or_else(|| "esports".to_string()),
        // Venue coordinates are not published upstream; flag as unknown.
        location: None,
        venue_name: m
            .tournament
            .and_then(|t| t.name)
            .unwrap_or_else(|| "Online".to_string()),
        start_time,
        end_time: None,
        price: None,
        registration_url: m.official_stream_url.or(m.live_url),
        source: "pandascore".to_string(),
        raw_data: raw.clone(),
    })
}

#[async_trait]
impl EventSource for EsportsSource {
    async fn fetch_events(
        &self,
        _location: GeoPoint,
        _radius_miles: f64,
        tags: &[String],
    ) -> Result<Vec<CanonicalEvent>> {
        let games: Vec<String> = if tags.is_empty() {
            DEFAULT_GAMES.iter().map(|g| g.to_string()).collect()
        } else {
            tags.to_vec()
        };

        let key = CacheGate::api_key("pandascore", &CacheParams { games: &games });
        if let Some(cached) = self.cache.get_json::<Vec<CanonicalEvent>>(&key).await {
            tracing::debug!(source = "pandascore", "returning cached events");
            return Ok(cached);
        }

        // One request per game, concurrently; a game's failure only costs
        // that game's results.
        let fetches = games.iter().map(|game| async move {
            match self.fetch_game(game).await {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!(error = ?e, source = "pandascore", game = %game, "per-game fetch failed");
                    counter!("aggregate_source_errors_total", "source" => "pandascore").increment(1);
                    Vec::new()
                }
            }
        });

        let events: Vec<CanonicalEvent> = join_all(fetches).await.into_iter().flatten().collect();

        counter!("aggregate_events_total", "source" => "pandascore").increment(events.len() as u64);
        self.cache.set_json(&key, &events, CACHE_TTL_SECS).await;
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "pandascore"
    }
}

// src/aggregate/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Coarse event classification; `category` carries the fine-grained tag
/// (e.g. "basketball", "valorant").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Sports,
    Esports,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Sports => "sports",
            EventType::Esports => "esports",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sports" => Ok(EventType::Sports),
            "esports" => Ok(EventType::Esports),
            other => Err(anyhow::anyhow!("unknown event type: {other}")),
        }
    }
}

/// The unified record every source normalizes into.
///
/// `external_id` is the dedup key: `{source}_{source-local id}`, stable
/// across repeated fetches of the same upstream item. `location` is `None`
/// when the upstream carries no venue coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub category: String,
    pub location: Option<GeoPoint>,
    pub venue_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// `None` means unknown; zero means free.
    pub price: Option<Decimal>,
    pub registration_url: Option<String>,
    pub source: String,
    /// Upstream payload preserved for auditing.
    pub raw_data: serde_json::Value,
}

/// Per-call knobs for an aggregation run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Category filter forwarded to the ticketing source.
    pub categories: Vec<String>,
    /// Game titles for the esports source; empty means its default set.
    pub games: Vec<String>,
    pub include_esports: bool,
    pub use_scraper: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            games: Vec::new(),
            include_esports: true,
            use_scraper: true,
        }
    }
}

/// One upstream provider of events. All sources are polymorphic over this
/// interface despite heterogeneous upstream shapes; normalization happens at
/// the adapter boundary so nothing downstream branches on source specifics.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch upcoming events near `location`. `tags` is source-specific:
    /// categories for the ticketing source, game titles for esports, unused
    /// by the scrape stub. Sources without a geo dimension ignore `location`.
    async fn fetch_events(
        &self,
        location: GeoPoint,
        radius_miles: f64,
        tags: &[String],
    ) -> Result<Vec<CanonicalEvent>>;

    fn name(&self) -> &'static str;
}

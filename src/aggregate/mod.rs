// src/aggregate/mod.rs
pub mod scheduler;
pub mod sources;
pub mod types;

use futures::future::{join_all, BoxFuture};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::aggregate::sources::{EsportsSource, ScraperSource, TicketingSource};
use crate::aggregate::types::{CanonicalEvent, EventSource, FetchOptions};
use crate::cache::CacheGate;
use crate::config::Config;
use crate::geo::GeoPoint;
use crate::store::EventStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "aggregate_events_total",
            "Events contributed by each source."
        );
        describe_counter!(
            "aggregate_source_errors_total",
            "Source fetch failures isolated by the aggregator."
        );
        describe_counter!("aggregate_runs_total", "Completed aggregation runs.");
        describe_counter!("store_upsert_total", "Events stored or refreshed.");
        describe_counter!("store_upsert_errors_total", "Per-record upsert failures.");
        describe_counter!("cache_hits_total", "Cache gate hits.");
        describe_counter!("cache_misses_total", "Cache gate misses.");
        describe_histogram!("source_fetch_ms", "Upstream fetch time in milliseconds.");
        describe_gauge!(
            "aggregate_last_run_ts",
            "Unix ts when the aggregation pipeline last ran."
        );
    });
}

/// Fan-out caller over the enabled sources.
///
/// A slot is `None` when the source is disabled by configuration (missing
/// credential); per-call options can further exclude the esports and scraper
/// slots. Every enabled source runs concurrently and the join waits for all
/// of them; one source's failure never cancels or fails the others.
pub struct Aggregator {
    ticketing: Option<Arc<dyn EventSource>>,
    esports: Option<Arc<dyn EventSource>>,
    scraper: Option<Arc<dyn EventSource>>,
}

impl Aggregator {
    pub fn new(
        ticketing: Option<Arc<dyn EventSource>>,
        esports: Option<Arc<dyn EventSource>>,
        scraper: Option<Arc<dyn EventSource>>,
    ) -> Self {
        Self {
            ticketing,
            esports,
            scraper,
        }
    }

    /// Wire the real sources from resolved configuration.
    pub fn from_config(
        cfg: &Config,
        http: reqwest::Client,
        cache: Arc<CacheGate>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        let ticketing: Option<Arc<dyn EventSource>> = cfg.ticketing.clone().map(|credentials| {
            Arc::new(TicketingSource::new(credentials, http.clone(), cache.clone()))
                as Arc<dyn EventSource>
        });

        let esports: Option<Arc<dyn EventSource>> = cfg.esports_api_key.clone().map(|key| {
            Arc::new(EsportsSource::new(key, http.clone(), cache.clone())) as Arc<dyn EventSource>
        });

        let scraper: Option<Arc<dyn EventSource>> = cfg
            .scraper_enabled
            .then(|| Arc::new(ScraperSource::new(store)) as Arc<dyn EventSource>);

        Self::new(ticketing, esports, scraper)
    }

    /// Fetch from every enabled source concurrently with settle-all
    /// semantics and concatenate the successes. Failures are logged and
    /// counted, never propagated; the caller persists the returned list.
    pub async fn fetch_events(
        &self,
        location: GeoPoint,
        radius_miles: f64,
        options: &FetchOptions,
    ) -> Vec<CanonicalEvent> {
        ensure_metrics_described();

        let empty: &[String] = &[];
        let mut branches: Vec<(&'static str, BoxFuture<'_, anyhow::Result<Vec<CanonicalEvent>>>)> =
            Vec::new();

        if let Some(src) = &self.ticketing {
            branches.push((
                src.name(),
                src.fetch_events(location, radius_miles, &options.categories),
            ));
        }
        if options.include_esports {
            if let Some(src) = &self.esports {
                branches.push((
                    src.name(),
                    src.fetch_events(location, radius_miles, &options.games),
                ));
            }
        }
        if options.use_scraper {
            if let Some(src) = &self.scraper {
                branches.push((src.name(), src.fetch_events(location, radius_miles, empty)));
            }
        }

        let settled = join_all(
            branches
                .into_iter()
                .map(|(name, fut)| async move { (name, fut.await) }),
        )
        .await;

        let mut all = Vec::new();
        for (name, result) in settled {
            match result {
                Ok(mut events) => {
                    tracing::debug!(source = name, count = events.len(), "source settled");
                    all.append(&mut events);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, source = name, "source fetch failed");
                    counter!("aggregate_source_errors_total", "source" => name).increment(1);
                }
            }
        }

        gauge!("aggregate_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(total = all.len(), "aggregated events");
        all
    }

    /// Which slots are wired, for startup logging.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(s) = &self.ticketing {
            names.push(s.name());
        }
        if let Some(s) = &self.esports {
            names.push(s.name());
        }
        if let Some(s) = &self.scraper {
            names.push(s.name());
        }
        names
    }
}

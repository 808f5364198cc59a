//! Event Scout — Binary Entrypoint
//! Boots the Axum HTTP server and the recurring aggregation task, wiring the
//! store, cache gate, sources, and routes.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_scout::aggregate::scheduler::{self, SchedulerCfg};
use event_scout::api::{create_router, AppState};
use event_scout::cache::CacheGate;
use event_scout::config::Config;
use event_scout::metrics;
use event_scout::store::{EventStore, MemoryEventStore, PgEventStore};
use event_scout::Aggregator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("event_scout=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;
    let metrics_handle = metrics::install(cfg.aggregate_interval_secs);

    let store: Arc<dyn EventStore> = match &cfg.database_url {
        Some(url) => Arc::new(PgEventStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set, using in-memory event store");
            Arc::new(MemoryEventStore::new())
        }
    };

    let cache = Arc::new(CacheGate::connect(cfg.redis_url.as_deref()).await);

    // One shared client; the timeout bounds every upstream call so a hung
    // source cannot stall an aggregation run indefinitely.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let aggregator = Arc::new(Aggregator::from_config(&cfg, http, cache, store.clone()));
    info!(sources = ?aggregator.enabled_sources(), "aggregator wired");

    scheduler::spawn(
        aggregator.clone(),
        store.clone(),
        SchedulerCfg {
            interval_secs: cfg.aggregate_interval_secs,
            location: cfg.home_location,
            radius_miles: cfg.home_radius_miles,
        },
    );

    let app = create_router(AppState { store, aggregator }).merge(metrics::router(metrics_handle));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

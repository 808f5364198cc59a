// src/aggregate/scheduler.rs
use metrics::{counter, gauge};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::aggregate::types::FetchOptions;
use crate::aggregate::Aggregator;
use crate::geo::GeoPoint;
use crate::store::EventStore;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
    pub location: GeoPoint,
    pub radius_miles: f64,
}

/// Spawn the recurring aggregation task. The first tick fires immediately,
/// so startup doubles as the initial fetch; after that the interval applies.
pub fn spawn(
    aggregator: Arc<Aggregator>,
    store: Arc<dyn EventStore>,
    cfg: SchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;

            let events = aggregator
                .fetch_events(cfg.location, cfg.radius_miles, &FetchOptions::default())
                .await;
            let stored = store.upsert_batch(&events).await;

            let now = chrono::Utc::now().timestamp().max(0) as u64;
            counter!("aggregate_runs_total").increment(1);
            gauge!("aggregate_last_run_ts").set(now as f64);

            tracing::info!(
                target: "aggregate",
                fetched = events.len(),
                stored,
                "scheduled aggregation tick"
            );
        }
    })
}

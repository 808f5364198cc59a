//! Prometheus recorder installation and the `/metrics` route.

use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder. Call once at startup, before the first
/// counter is touched; a second install panics.
pub fn install(aggregate_interval_secs: u64) -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus: install recorder");

    // Static gauge so dashboards can annotate the expected run cadence.
    gauge!("aggregate_interval_secs").set(aggregate_interval_secs as f64);

    handle
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}

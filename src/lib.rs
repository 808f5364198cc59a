// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod geo;
pub mod metrics;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::types::{CanonicalEvent, EventSource, EventType, FetchOptions};
pub use crate::aggregate::Aggregator;
pub use crate::api::{create_router, AppState};
pub use crate::cache::CacheGate;
pub use crate::config::Config;
pub use crate::geo::GeoPoint;
pub use crate::store::{EventStore, MemoryEventStore, PgEventStore};

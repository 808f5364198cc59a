//! Event persistence: insert-or-update keyed by `external_id`, plus the read
//! paths the search API uses.
//!
//! The upsert refreshes display fields only (`title`, `description`,
//! `start_time`); everything else keeps its originally stored value. Each
//! record is written independently so one bad record never blocks the batch.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::aggregate::types::{CanonicalEvent, EventType};
use crate::geo::GeoPoint;

/// A persisted event row.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEvent {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub category: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub venue_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
    pub registration_url: Option<String>,
    pub source: String,
    /// Populated on single-event reads only; search results omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

/// Read filters for the search path. `starts_after: None` means unbounded;
/// the API layer defaults it to "now".
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub starts_after: Option<DateTime<Utc>>,
    pub ends_before: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub event_type: Option<EventType>,
    pub limit: i64,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            starts_after: None,
            ends_before: None,
            category: None,
            event_type: None,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub event_type: EventType,
    pub count: i64,
}

#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new row if `external_id` is unseen; otherwise refresh
    /// `title`, `description` and `start_time` and leave the rest alone.
    async fn upsert(&self, event: &CanonicalEvent) -> Result<()>;

    async fn get(&self, id: i64) -> Result<Option<StoredEvent>>;

    /// Rows matching the filters, ordered by `start_time` ascending.
    async fn search(&self, query: &EventQuery) -> Result<Vec<StoredEvent>>;

    /// Distinct `(category, event_type)` pairs over upcoming events, most
    /// frequent first.
    async fn categories(&self) -> Result<Vec<CategoryCount>>;

    /// Upsert each record independently; a failure is logged and skipped.
    /// Returns the number of records stored.
    async fn upsert_batch(&self, events: &[CanonicalEvent]) -> usize {
        let mut stored = 0usize;
        for ev in events {
            match self.upsert(ev).await {
                Ok(()) => {
                    stored += 1;
                    counter!("store_upsert_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, external_id = %ev.external_id, "event upsert failed");
                    counter!("store_upsert_errors_total").increment(1);
                }
            }
        }
        stored
    }
}

// ---------------------------------------------------------------------------
// Postgres store
// ---------------------------------------------------------------------------

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connecting to postgres")?;
        MIGRATOR.run(&pool).await.context("running migrations")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_stored(row: &PgRow, with_raw: bool) -> Result<StoredEvent> {
    let event_type: String = row.try_get("event_type")?;
    Ok(StoredEvent {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        event_type: event_type.parse()?,
        category: row.try_get("category")?,
        lat: row.try_get("lat")?,
        lng: row.try_get("lng")?,
        venue_name: row.try_get("venue_name")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        price: row.try_get("price")?,
        registration_url: row.try_get("registration_url")?,
        source: row.try_get("source")?,
        raw_data: if with_raw { row.try_get("raw_data")? } else { None },
        created_at: row.try_get("created_at")?,
    })
}

const SEARCH_COLUMNS: &str = "id, external_id, title, description, event_type, category, \
     lat, lng, venue_name, start_time, end_time, price, registration_url, source, created_at";

#[async_trait::async_trait]
impl EventStore for PgEventStore {
    async fn upsert(&self, event: &CanonicalEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (
                external_id, title, description, event_type, category,
                lat, lng, venue_name, start_time, end_time, price,
                registration_url, source, raw_data
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (external_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                start_time = EXCLUDED.start_time
            "#,
        )
        .bind(&event.external_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(&event.category)
        .bind(event.location.map(|p| p.lat))
        .bind(event.location.map(|p| p.lng))
        .bind(&event.venue_name)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.price)
        .bind(&event.registration_url)
        .bind(&event.source)
        .bind(&event.raw_data)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upserting event {}", event.external_id))?;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<StoredEvent>> {
        let row = sqlx::query(
            r#"
            SELECT id, external_id, title, description, event_type, category,
                   lat, lng, venue_name, start_time, end_time, price,
                   registration_url, source, raw_data, created_at
            FROM events WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching event by id")?;

        row.as_ref().map(|r| row_to_stored(r, true)).transpose()
    }

    async fn search(&self, query: &EventQuery) -> Result<Vec<StoredEvent>> {
        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {SEARCH_COLUMNS} FROM events WHERE start_time >= "));
        qb.push_bind(query.starts_after.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));

        if let Some(category) = &query.category {
            qb.push(" AND category = ");
            qb.push_bind(category);
        }
        if let Some(event_type) = query.event_type {
            qb.push(" AND event_type = ");
            qb.push_bind(event_type.as_str());
        }
        if let Some(ends_before) = query.ends_before {
            qb.push(" AND start_time <= ");
            qb.push_bind(ends_before);
        }
        qb.push(" ORDER BY start_time LIMIT ");
        qb.push_bind(query.limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("searching events")?;

        rows.iter().map(|r| row_to_stored(r, false)).collect()
    }

    async fn categories(&self) -> Result<Vec<CategoryCount>> {
        let rows = sqlx::query(
            r#"
            SELECT category, event_type, COUNT(*) AS count
            FROM events
            WHERE start_time >= NOW()
            GROUP BY category, event_type
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("fetching categories")?;

        rows.iter()
            .map(|r| -> Result<CategoryCount> {
                let event_type: String = r.try_get("event_type")?;
                Ok(CategoryCount {
                    category: r.try_get("category")?,
                    event_type: event_type.parse()?,
                    count: r.try_get("count")?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Same upsert policy as [`PgEventStore`], backed by a map. Used by tests and
/// as the degrade mode when `DATABASE_URL` is unset.
pub struct MemoryEventStore {
    inner: Mutex<MemoryInner>,
}

struct MemoryInner {
    rows: HashMap<String, StoredEvent>,
    next_id: i64,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                rows: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a row by external id, for assertions.
    pub fn get_by_external_id(&self, external_id: &str) -> Option<StoredEvent> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.rows.get(external_id).cloned()
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryEventStore {
    async fn upsert(&self, event: &CanonicalEvent) -> Result<()> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if let Some(row) = inner.rows.get_mut(&event.external_id) {
            // Refresh display fields only.
            row.title = event.title.clone();
            row.description = event.description.clone();
            row.start_time = event.start_time;
            return Ok(());
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.insert(
            event.external_id.clone(),
            StoredEvent {
                id,
                external_id: event.external_id.clone(),
                title: event.title.clone(),
                description: event.description.clone(),
                event_type: event.event_type,
                category: event.category.clone(),
                lat: event.location.map(|p| p.lat),
                lng: event.location.map(|p| p.lng),
                venue_name: event.venue_name.clone(),
                start_time: event.start_time,
                end_time: event.end_time,
                price: event.price,
                registration_url: event.registration_url.clone(),
                source: event.source.clone(),
                raw_data: Some(event.raw_data.clone()),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<StoredEvent>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.rows.values().find(|r| r.id == id).cloned())
    }

    async fn search(&self, query: &EventQuery) -> Result<Vec<StoredEvent>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut out: Vec<StoredEvent> = inner
            .rows
            .values()
            .filter(|r| query.starts_after.is_none_or(|t| r.start_time >= t))
            .filter(|r| query.ends_before.is_none_or(|t| r.start_time <= t))
            .filter(|r| query.category.as_deref().is_none_or(|c| r.category == c))
            .filter(|r| query.event_type.is_none_or(|t| r.event_type == t))
            .cloned()
            .map(|mut r| {
                r.raw_data = None;
                r
            })
            .collect();
        out.sort_by_key(|r| r.start_time);
        out.truncate(query.limit.max(0) as usize);
        Ok(out)
    }

    async fn categories(&self) -> Result<Vec<CategoryCount>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let now = Utc::now();
        let mut counts: HashMap<(String, EventType), i64> = HashMap::new();
        for r in inner.rows.values().filter(|r| r.start_time >= now) {
            *counts.entry((r.category.clone(), r.event_type)).or_default() += 1;
        }
        let mut out: Vec<CategoryCount> = counts
            .into_iter()
            .map(|((category, event_type), count)| CategoryCount {
                category,
                event_type,
                count,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
        Ok(out)
    }
}

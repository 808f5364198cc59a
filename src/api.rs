//! HTTP surface for the aggregation pipeline: location search over stored
//! events, on-demand refresh, and a couple of read-only helpers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregate::types::{EventType, FetchOptions};
use crate::aggregate::Aggregator;
use crate::geo::{self, GeoPoint};
use crate::store::{CategoryCount, EventQuery, EventStore, StoredEvent};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub aggregator: Arc<Aggregator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/events/search", get(search_events))
        .route("/events/refresh", post(refresh_events))
        .route("/events/meta/categories", get(event_categories))
        .route("/events/{id}", get(get_event))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

fn bad_request(msg: &str) -> ApiError {
    ApiError(StatusCode::BAD_REQUEST, msg.to_string())
}

fn internal(context: &str, e: anyhow::Error) -> ApiError {
    tracing::error!(error = ?e, context, "request failed");
    ApiError(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {context}"),
    )
}

#[derive(Deserialize)]
struct SearchParams {
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
    category: Option<String>,
    event_type: Option<EventType>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    limit: Option<i64>,
}

#[derive(Serialize)]
struct SearchEvent {
    #[serde(flatten)]
    event: StoredEvent,
    /// `null` when the event's venue coordinates are unknown.
    distance_miles: Option<f64>,
}

#[derive(Serialize)]
struct SearchResponse {
    count: usize,
    events: Vec<SearchEvent>,
}

/// Search stored events by location. Rows inside the radius come first,
/// nearest first; rows with unknown coordinates follow, flagged with a null
/// distance rather than silently dropped.
async fn search_events(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return Err(bad_request("Latitude and longitude required"));
    };
    let origin = GeoPoint::new(lat, lng);
    let radius = params.radius.unwrap_or(50.0);

    let query = EventQuery {
        starts_after: Some(params.start_date.unwrap_or_else(Utc::now)),
        ends_before: params.end_date,
        category: params.category,
        event_type: params.event_type,
        limit: params.limit.unwrap_or(50),
    };

    let rows = state
        .store
        .search(&query)
        .await
        .map_err(|e| internal("search events", e))?;

    let ranked = geo::rank_by_distance(rows, origin, radius, |e: &StoredEvent| e.location());

    let mut events: Vec<SearchEvent> = ranked
        .within
        .into_iter()
        .map(|(event, d)| SearchEvent {
            event,
            distance_miles: Some((d * 100.0).round() / 100.0),
        })
        .collect();
    events.extend(ranked.unlocated.into_iter().map(|event| SearchEvent {
        event,
        distance_miles: None,
    }));

    Ok(Json(SearchResponse {
        count: events.len(),
        events,
    }))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredEvent>, ApiError> {
    match state.store.get(id).await {
        Ok(Some(event)) => Ok(Json(event)),
        Ok(None) => Err(ApiError(
            StatusCode::NOT_FOUND,
            "Event not found".to_string(),
        )),
        Err(e) => Err(internal("fetch event", e)),
    }
}

#[derive(Deserialize)]
struct RefreshRequest {
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(default = "default_refresh_radius")]
    radius: f64,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    games: Vec<String>,
}

fn default_refresh_radius() -> f64 {
    50.0
}

#[derive(Serialize)]
struct RefreshResponse {
    message: &'static str,
    count: usize,
}

/// Run the aggregator on demand and persist the combined list.
async fn refresh_events(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let (Some(lat), Some(lng)) = (body.lat, body.lng) else {
        return Err(bad_request("Location required"));
    };

    let options = FetchOptions {
        categories: body.categories,
        games: body.games,
        include_esports: true,
        use_scraper: true,
    };

    let events = state
        .aggregator
        .fetch_events(GeoPoint::new(lat, lng), body.radius, &options)
        .await;
    state.store.upsert_batch(&events).await;

    Ok(Json(RefreshResponse {
        message: "Events refreshed successfully",
        count: events.len(),
    }))
}

async fn event_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    state
        .store
        .categories()
        .await
        .map(Json)
        .map_err(|e| internal("fetch categories", e))
}

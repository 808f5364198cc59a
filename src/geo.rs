//! Great-circle distance math and the query-time distance ranking applied to
//! stored events.
//!
//! `distance_miles` is a total function: out-of-range degrees are accepted
//! uncritically and produce a mathematically defined (if meaningless) result.

use serde::{Deserialize, Serialize};

/// Earth's radius in miles.
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A WGS84-ish coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance between two coordinates, in miles.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin() * (d_lon / 2.0).sin();

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * 1609.34
}

/// Result of [`rank_by_distance`]: items inside the radius, ascending by
/// distance, and items whose coordinates are unknown.
///
/// Unlocated items are surfaced separately rather than filtered: some sources
/// (the esports upstream) carry no venue coordinates at all, and a distance
/// against a made-up point would be meaningless. Callers flag these to the
/// user instead of deciding for them.
#[derive(Debug)]
pub struct DistanceRanked<T> {
    /// `(item, distance_miles)` pairs with `distance <= radius`, ascending.
    pub within: Vec<(T, f64)>,
    /// Items with no coordinates, in their original relative order.
    pub unlocated: Vec<T>,
}

/// Filter items to those within `radius_miles` of `origin` and sort them
/// ascending by distance. The sort is stable: ties keep their original
/// relative order.
pub fn rank_by_distance<T, F>(
    items: Vec<T>,
    origin: GeoPoint,
    radius_miles: f64,
    coords: F,
) -> DistanceRanked<T>
where
    F: Fn(&T) -> Option<GeoPoint>,
{
    let mut within = Vec::new();
    let mut unlocated = Vec::new();

    for item in items {
        match coords(&item) {
            Some(p) => {
                let d = distance_miles(origin.lat, origin.lng, p.lat, p.lng);
                if d <= radius_miles {
                    within.push((item, d));
                }
            }
            None => unlocated.push(item),
        }
    }

    within.sort_by(|a, b| a.1.total_cmp(&b.1));

    DistanceRanked { within, unlocated }
}

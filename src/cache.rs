//! Read-through cache gate in front of the networked sources.
//!
//! Backed by Redis when `REDIS_URL` is reachable at startup; otherwise every
//! `get` is a miss and every `set` a no-op. Callers must treat caching as a
//! performance optimization, never a correctness dependency.

use metrics::counter;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct CacheGate {
    conn: Option<ConnectionManager>,
}

impl CacheGate {
    /// Connect to Redis if a URL is configured. Any failure here degrades to
    /// the disabled gate rather than erroring: the service runs fine without
    /// a cache, just slower against the upstreams.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else {
            tracing::info!("no REDIS_URL configured, cache gate disabled");
            return Self::disabled();
        };

        let client = match redis::Client::open(url) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = ?e, "invalid redis url, cache gate disabled");
                return Self::disabled();
            }
        };

        match client.get_connection_manager().await {
            Ok(conn) => {
                tracing::info!("cache gate connected");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                tracing::warn!(error = ?e, "redis unreachable, cache gate disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    /// Deterministic key for an upstream API call: `api:{source}:{params}`
    /// where params is the canonical JSON of the query parameters. Struct
    /// field order is fixed, so equal parameters always yield equal keys.
    pub fn api_key<P: Serialize>(source: &str, params: &P) -> String {
        let params = serde_json::to_string(params).unwrap_or_default();
        format!("api:{source}:{params}")
    }

    /// Fetch and deserialize a cached value. Backend errors and decode
    /// failures count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(v) => {
                    counter!("cache_hits_total").increment(1);
                    Some(v)
                }
                Err(e) => {
                    tracing::warn!(error = ?e, key, "cache payload decode failed");
                    counter!("cache_misses_total").increment(1);
                    None
                }
            },
            Ok(None) => {
                counter!("cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                tracing::warn!(error = ?e, key, "cache get failed");
                counter!("cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Serialize and store a value with a TTL. Returns false when the gate
    /// is disabled or the backend rejects the write.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let Some(conn) = &self.conn else {
            return false;
        };
        let mut conn = conn.clone();

        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = ?e, key, "cache payload encode failed");
                return false;
            }
        };

        match conn.set_ex::<_, _, ()>(key, payload, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, key, "cache set failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(conn) = &self.conn else {
            return false;
        };
        let mut conn = conn.clone();
        match conn.del::<_, ()>(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, key, "cache delete failed");
                false
            }
        }
    }

    /// Delete every key matching a glob pattern (e.g. `api:seatgeek:*`).
    pub async fn delete_by_prefix(&self, pattern: &str) -> bool {
        let Some(conn) = &self.conn else {
            return false;
        };
        let mut conn = conn.clone();

        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!(error = ?e, pattern, "cache keys scan failed");
                return false;
            }
        };
        if keys.is_empty() {
            return true;
        }
        match conn.del::<_, ()>(keys).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = ?e, pattern, "cache pattern delete failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Params<'a> {
        lat: f64,
        lng: f64,
        radius: f64,
        categories: &'a [String],
    }

    #[test]
    fn api_key_is_deterministic() {
        let cats = vec!["basketball".to_string()];
        let p = Params {
            lat: 42.0987,
            lng: -75.9179,
            radius: 50.0,
            categories: &cats,
        };
        let a = CacheGate::api_key("seatgeek", &p);
        let b = CacheGate::api_key("seatgeek", &p);
        assert_eq!(a, b);
        assert!(a.starts_with("api:seatgeek:{"));
    }

    #[tokio::test]
    async fn disabled_gate_is_a_pure_miss() {
        let gate = CacheGate::disabled();
        assert!(!gate.is_enabled());
        let got: Option<Vec<String>> = gate.get_json("api:seatgeek:{}").await;
        assert!(got.is_none());
        assert!(!gate.set_json("api:seatgeek:{}", &vec!["x"], 60).await);
        assert!(!gate.delete("api:seatgeek:{}").await);
        assert!(!gate.delete_by_prefix("api:seatgeek:*").await);
    }
}

//! One-shot environment resolution.
//!
//! Everything the service reads from the environment is resolved here once
//! at startup and passed down; sources never re-inspect raw configuration.
//! A missing credential silently disables its source; that is the feature
//! toggle, not an error.

use anyhow::{Context, Result};
use std::net::SocketAddr;

use crate::aggregate::sources::TicketingCredentials;
use crate::geo::GeoPoint;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_INTERVAL_SECS: u64 = 4 * 3600;

// The scheduler's home search area when none is configured.
const DEFAULT_HOME: GeoPoint = GeoPoint {
    lat: 42.0987,
    lng: -75.9179,
};
const DEFAULT_HOME_RADIUS_MILES: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    /// `Some` iff the ticketing source is enabled.
    pub ticketing: Option<TicketingCredentials>,
    /// `Some` iff the esports source is enabled.
    pub esports_api_key: Option<String>,
    pub scraper_enabled: bool,
    pub aggregate_interval_secs: u64,
    pub home_location: GeoPoint,
    pub home_radius_miles: f64,
}

/// Startup summary of which sources resolved as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceToggles {
    pub ticketing_enabled: bool,
    pub esports_enabled: bool,
    pub scraper_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = match std::env::var("PORT") {
            Ok(v) => v.parse().context("parsing PORT")?,
            Err(_) => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = ([0, 0, 0, 0], port).into();

        let ticketing = credential("SEATGEEK_CLIENT_ID").map(|client_id| TicketingCredentials {
            client_id,
            client_secret: credential("SEATGEEK_CLIENT_SECRET"),
        });

        let interval = match std::env::var("AGGREGATE_INTERVAL_SECS") {
            Ok(v) => v.parse().context("parsing AGGREGATE_INTERVAL_SECS")?,
            Err(_) => DEFAULT_INTERVAL_SECS,
        };

        let home_location = GeoPoint {
            lat: env_f64("HOME_LAT")?.unwrap_or(DEFAULT_HOME.lat),
            lng: env_f64("HOME_LNG")?.unwrap_or(DEFAULT_HOME.lng),
        };

        Ok(Self {
            bind_addr,
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            ticketing,
            esports_api_key: credential("PANDASCORE_API_KEY"),
            scraper_enabled: std::env::var("SCRAPER_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            aggregate_interval_secs: interval,
            home_location,
            home_radius_miles: env_f64("HOME_RADIUS_MILES")?.unwrap_or(DEFAULT_HOME_RADIUS_MILES),
        })
    }

    pub fn source_toggles(&self) -> SourceToggles {
        SourceToggles {
            ticketing_enabled: self.ticketing.is_some(),
            esports_enabled: self.esports_api_key.is_some(),
            scraper_enabled: self.scraper_enabled,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A credential counts as configured only when it is non-empty and not a
/// `your_...` placeholder left over from an env template.
fn credential(name: &str) -> Option<String> {
    non_empty_var(name).filter(|v| !v.to_ascii_lowercase().starts_with("your_"))
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(v) => Ok(Some(v.parse().with_context(|| format!("parsing {name}"))?)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[serial_test::serial]
    #[test]
    fn placeholder_credentials_count_as_unset() {
        env::set_var("SEATGEEK_CLIENT_ID", "your_seatgeek_client_id");
        env::set_var("PANDASCORE_API_KEY", "your_pandascore_api_key");
        env::remove_var("SCRAPER_ENABLED");

        let cfg = Config::from_env().unwrap();
        let toggles = cfg.source_toggles();
        assert!(!toggles.ticketing_enabled);
        assert!(!toggles.esports_enabled);
        assert!(toggles.scraper_enabled);

        env::remove_var("SEATGEEK_CLIENT_ID");
        env::remove_var("PANDASCORE_API_KEY");
    }

    #[serial_test::serial]
    #[test]
    fn real_credentials_enable_sources() {
        env::set_var("SEATGEEK_CLIENT_ID", "abc123");
        env::set_var("PANDASCORE_API_KEY", "def456");

        let cfg = Config::from_env().unwrap();
        assert!(cfg.source_toggles().ticketing_enabled);
        assert!(cfg.source_toggles().esports_enabled);
        assert_eq!(cfg.ticketing.unwrap().client_id, "abc123");

        env::remove_var("SEATGEEK_CLIENT_ID");
        env::remove_var("PANDASCORE_API_KEY");
    }

    #[serial_test::serial]
    #[test]
    fn scraper_can_be_disabled() {
        env::set_var("SCRAPER_ENABLED", "false");
        let cfg = Config::from_env().unwrap();
        assert!(!cfg.scraper_enabled);
        env::remove_var("SCRAPER_ENABLED");
    }
}

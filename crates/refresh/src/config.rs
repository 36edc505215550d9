use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_ADDRESS: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_day.geojson";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Runtime settings for the overlay controller.
///
/// Every field has a default, so partial documents deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Address used when the operator submits an empty endpoint.
    pub default_address: String,
    /// Upper bound on a single fetch. `0` disables the timeout.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub max_response_bytes: u64,
    /// Buffered refresh events per subscriber before old ones are dropped.
    pub event_capacity: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            default_address: DEFAULT_ADDRESS.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: concat!("overlay-refresh/", env!("CARGO_PKG_VERSION")).to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RefreshConfig {
    /// Defaults overlaid with `OVERLAY_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(address) = lookup("OVERLAY_DEFAULT_ADDRESS")
            && !address.trim().is_empty()
        {
            self.default_address = address.trim().to_string();
        }
        if let Some(agent) = lookup("OVERLAY_USER_AGENT")
            && !agent.trim().is_empty()
        {
            self.user_agent = agent;
        }
        self.fetch_timeout_secs =
            parse_or(&lookup, "OVERLAY_FETCH_TIMEOUT_SECS", self.fetch_timeout_secs);
        self.max_response_bytes =
            parse_or(&lookup, "OVERLAY_MAX_RESPONSE_BYTES", self.max_response_bytes);
        self.event_capacity = parse_or(&lookup, "OVERLAY_EVENT_CAPACITY", self.event_capacity);
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{DEFAULT_ADDRESS, RefreshConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_point_at_usgs_feed() {
        let config = RefreshConfig::default();
        assert_eq!(config.default_address, DEFAULT_ADDRESS);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
        assert!(config.user_agent.starts_with("overlay-refresh/"));
    }

    #[test]
    fn env_overrides_ignore_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OVERLAY_DEFAULT_ADDRESS", " https://example.org/feed.geojson "),
            ("OVERLAY_FETCH_TIMEOUT_SECS", "0"),
            ("OVERLAY_MAX_RESPONSE_BYTES", "lots"),
            ("OVERLAY_EVENT_CAPACITY", "8"),
        ]);
        let config =
            RefreshConfig::default().with_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.default_address, "https://example.org/feed.geojson");
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(config.max_response_bytes, super::DEFAULT_MAX_RESPONSE_BYTES);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: RefreshConfig =
            serde_json::from_str(r#"{"fetch_timeout_secs": 5}"#).expect("config");
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.default_address, DEFAULT_ADDRESS);
    }
}

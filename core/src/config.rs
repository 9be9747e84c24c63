//! Session configuration.
//!
//! Values come from the host (deserialized from whatever settings file it
//! uses) or from the environment via `SessionConfig::from_env`.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

pub const STORE_URL_VAR: &str = "LISTKEEPER_STORE_URL";
pub const UTC_OFFSET_VAR: &str = "LISTKEEPER_UTC_OFFSET_MINUTES";
pub const DEFAULT_STORE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the document store.
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// Offset from UTC, in minutes, used when formatting due dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_url: default_store_url(),
            utc_offset_minutes: 0,
        }
    }
}

impl SessionConfig {
    pub fn new(store_url: &str) -> Self {
        Self {
            store_url: store_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Read `LISTKEEPER_STORE_URL` and `LISTKEEPER_UTC_OFFSET_MINUTES`,
    /// falling back to the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(STORE_URL_VAR) {
            config.store_url = url;
        }
        if let Ok(raw) = std::env::var(UTC_OFFSET_VAR) {
            match raw.trim().parse() {
                Ok(minutes) => config.utc_offset_minutes = minutes,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable LISTKEEPER_UTC_OFFSET_MINUTES"),
            }
        }
        config
    }

    /// The display offset; out-of-range values fall back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        match self.utc_offset_minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => offset,
            None => {
                tracing::warn!(minutes = self.utc_offset_minutes, "UTC offset out of range, using UTC");
                Utc.fix()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.store_url, "http://localhost:3000");
    }

    #[test]
    fn display_offset_in_minutes() {
        let config = SessionConfig::new("http://x").with_utc_offset_minutes(-300);
        assert_eq!(config.display_offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn absurd_offset_falls_back_to_utc() {
        let config = SessionConfig::default().with_utc_offset_minutes(100_000);
        assert_eq!(config.display_offset().local_minus_utc(), 0);
    }
}

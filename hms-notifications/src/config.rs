use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_toast_ttl_secs")]
    pub toast_ttl_secs: u64,
    /// Transport-level request timeout. The engine itself never times out a call.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_api_base_url() -> String { "http://localhost:5000/api".into() }
fn default_poll_interval_secs() -> u64 { 30 }
fn default_toast_ttl_secs() -> u64 { 5 }
fn default_http_timeout_secs() -> u64 { 15 }
fn default_event_capacity() -> usize { 64 }

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            toast_ttl_secs: default_toast_ttl_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            auth_token: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl NotifyConfig {
    /// Read `HMS_NOTIFY__*` environment variables, e.g.
    /// `HMS_NOTIFY__API_BASE_URL`. Falls back to defaults if they don't parse.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("HMS_NOTIFY").separator("__"))
            .build()?;
        Ok(config.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid HMS_NOTIFY configuration, using defaults");
            Self::default()
        }))
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs(self.toast_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_cadence() {
        let config = NotifyConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.toast_ttl(), Duration::from_secs(5));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = NotifyConfig {
            poll_interval_secs: 0,
            ..NotifyConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_source_fills_defaults() {
        let source = config::Config::builder()
            .set_override("api_base_url", "https://hms.example.org/api")
            .unwrap()
            .set_override("poll_interval_secs", 10)
            .unwrap()
            .build()
            .unwrap();
        let config: NotifyConfig = source.try_deserialize().unwrap();

        assert_eq!(config.api_base_url, "https://hms.example.org/api");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.http_timeout_secs, 15);
        assert_eq!(config.event_capacity, 64);
    }
}

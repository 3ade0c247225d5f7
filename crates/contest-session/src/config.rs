use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::SessionError;

type Result<T> = anyhow::Result<T>;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl ClientConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("failed to deserialize client config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), SessionError> {
        if self.base_url.trim().is_empty() {
            return Err(SessionError::Config("base_url 不能为空".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(SessionError::Config("request_timeout_ms 必须大于 0".to_string()));
        }
        if self.polling.interval_ms == 0 || self.polling.ceiling_ms == 0 {
            return Err(SessionError::Config(
                "polling.interval_ms 与 polling.ceiling_ms 必须大于 0".to_string(),
            ));
        }
        if self.leaderboard.refresh_interval_ms == 0 {
            return Err(SessionError::Config(
                "leaderboard.refresh_interval_ms 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            event_buffer_size: default_event_buffer_size(),
            polling: PollingConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_ceiling_ms")]
    pub ceiling_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            ceiling_ms: default_poll_ceiling_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl LeaderboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_event_buffer_size() -> usize {
    256
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_poll_ceiling_ms() -> u64 {
    30_000
}

fn default_refresh_interval_ms() -> u64 {
    15_000
}

#[cfg(test)]
mod tests {
    use super::ClientConfig;

    #[test]
    fn test_parse_config() {
        let raw = r#"
base_url = "http://judge.internal:9000"
request_timeout_ms = 5000
event_buffer_size = 64

[polling]
interval_ms = 1000
ceiling_ms = 20000

[leaderboard]
refresh_interval_ms = 5000
"#;

        let config = ClientConfig::from_str(raw).expect("config should parse");
        assert_eq!(config.base_url, "http://judge.internal:9000");
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.event_buffer_size, 64);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.polling.ceiling_ms, 20000);
        assert_eq!(config.leaderboard.refresh_interval_ms, 5000);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::from_str("").expect("empty config should parse");

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.polling.ceiling_ms, 30000);
        assert_eq!(config.leaderboard.refresh_interval_ms, 15000);
        assert_eq!(config.event_buffer_size, 256);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = ClientConfig::from_str("[polling]\ninterval_ms = 0\n")
            .expect_err("zero interval should be rejected");

        assert!(format!("{err:#}").contains("interval_ms"));
    }

    #[test]
    fn test_blank_base_url_is_rejected() {
        assert!(ClientConfig::from_str("base_url = \"  \"\n").is_err());
    }
}

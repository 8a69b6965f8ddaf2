//! Engine and application configuration.
//!
//! [`EngineConfig`] is plain data with sensible defaults; the binary loads
//! [`AppConfig`] through the `config` crate, layering an optional
//! `jobwatch.toml` file under environment variables prefixed `JOBWATCH_`.

use std::time::Duration;

use serde::Deserialize;

/// Poll channel configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between status requests.
    pub interval: Duration,
    /// Page size for the supplementary yield-point endpoint.
    pub yield_page_limit: u32,
    /// Maximum supplementary pages fetched per tick (0 disables).
    pub max_yield_pages: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            yield_page_limit: 500,
            max_yield_pages: 4,
        }
    }
}

/// Push channel reconnect configuration.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Initial backoff before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier per attempt.
    pub backoff_multiplier: f64,
    /// Reconnect attempts before the push channel gives up and leaves the
    /// poll channel as the only update source.
    pub max_reconnect_attempts: u32,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_reconnect_attempts: 10,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Poll channel settings.
    pub poll: PollConfig,
    /// Push channel settings.
    pub push: PushConfig,
    /// How long both channels may stay silent (while connecting or running)
    /// before the view flags the non-fatal "still trying" indicator.
    pub stall_threshold: Duration,
    /// Interval of the UI clock tick that republishes elapsed time.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            push: PushConfig::default(),
            stall_threshold: Duration::from_secs(15),
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Settings for the `jobwatch` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the job-status HTTP API.
    pub api_base_url: String,
    /// Base URL of the push subscription endpoint (ws:// or wss://).
    pub stream_base_url: String,
    /// Job to watch when none is given on the command line.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Poll interval override, in milliseconds.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Stall threshold override, in seconds.
    #[serde(default)]
    pub stall_threshold_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from `jobwatch.toml` (optional) and
    /// `JOBWATCH_`-prefixed environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("api_base_url", "http://localhost:8080")?
            .set_default("stream_base_url", "ws://localhost:8080")?
            .add_source(config::File::with_name("jobwatch").required(false))
            .add_source(config::Environment::with_prefix("JOBWATCH"))
            .build()?
            .try_deserialize()
    }

    /// Engine configuration with any overrides applied.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig::default();
        if let Some(ms) = self.poll_interval_ms {
            engine.poll.interval = Duration::from_millis(ms.max(100));
        }
        if let Some(secs) = self.stall_threshold_secs {
            engine.stall_threshold = Duration::from_secs(secs.max(1));
        }
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.push.max_reconnect_attempts, 10);
        assert!(config.stall_threshold > config.poll.interval);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn overrides_apply_with_floors() {
        let app = AppConfig {
            api_base_url: "http://api".to_string(),
            stream_base_url: "ws://api".to_string(),
            job_id: None,
            poll_interval_ms: Some(10),
            stall_threshold_secs: Some(0),
        };
        let engine = app.engine_config();
        assert_eq!(engine.poll.interval, Duration::from_millis(100));
        assert_eq!(engine.stall_threshold, Duration::from_secs(1));
    }
}

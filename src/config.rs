//! Configuration Module
//!
//! Handles loading and managing engine and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::snapshot::{EngineOptions, FailurePolicy};
use crate::tasks::{PollSettings, RefreshInterval};

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis host name or address
    pub redis_host: String,
    /// Redis TCP port
    pub redis_port: u16,
    /// Optional ACL user name
    pub redis_username: Option<String>,
    /// Optional password
    pub redis_password: Option<String>,
    /// Logical database index
    pub redis_db: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between automatic polls
    pub refresh_interval: RefreshInterval,
    /// Whether the poller starts with auto-refresh enabled
    pub auto_refresh: bool,
    /// Upper bound on a single poll, in seconds
    pub poll_timeout: u64,
    /// COUNT hint passed to each SCAN call
    pub scan_count: usize,
    /// Maximum display length per entry, 0 = unbounded
    pub max_display_chars: usize,
    /// Skip undecodable keys instead of failing the whole snapshot
    pub skip_undecodable: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_USERNAME` / `REDIS_PASSWORD` - Credentials (default: none)
    /// - `REDIS_DB` - Database index (default: 0)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REFRESH_INTERVAL` - One of 5, 15, 30, 60 seconds (default: 15)
    /// - `AUTO_REFRESH` - Start polling immediately (default: true)
    /// - `POLL_TIMEOUT` - Per-poll bound in seconds (default: 10)
    /// - `SCAN_COUNT` - SCAN COUNT hint (default: 100)
    /// - `MAX_DISPLAY_CHARS` - Display bound, 0 disables it (default: 4096)
    /// - `SKIP_UNDECODABLE` - Skip bad keys instead of failing (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_var("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_username: non_empty_var("REDIS_USERNAME"),
            redis_password: non_empty_var("REDIS_PASSWORD"),
            redis_db: parse_var("REDIS_DB").unwrap_or(defaults.redis_db),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            refresh_interval: parse_var("REFRESH_INTERVAL").unwrap_or(defaults.refresh_interval),
            auto_refresh: parse_var("AUTO_REFRESH").unwrap_or(defaults.auto_refresh),
            poll_timeout: parse_var("POLL_TIMEOUT").unwrap_or(defaults.poll_timeout),
            scan_count: parse_var("SCAN_COUNT")
                .filter(|count| *count > 0)
                .unwrap_or(defaults.scan_count),
            max_display_chars: parse_var("MAX_DISPLAY_CHARS")
                .unwrap_or(defaults.max_display_chars),
            skip_undecodable: parse_var("SKIP_UNDECODABLE").unwrap_or(defaults.skip_undecodable),
        }
    }

    /// Builds the engine options described by this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            scan_count: self.scan_count,
            poll_timeout: Duration::from_secs(self.poll_timeout),
            max_display_chars: (self.max_display_chars > 0).then_some(self.max_display_chars),
            policy: if self.skip_undecodable {
                FailurePolicy::SkipKey
            } else {
                FailurePolicy::FailFast
            },
        }
    }

    /// Builds the initial poller settings.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            auto_refresh: self.auto_refresh,
            interval: self.refresh_interval,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_username: None,
            redis_password: None,
            redis_db: 0,
            server_port: 3000,
            refresh_interval: RefreshInterval::default(),
            auto_refresh: true,
            poll_timeout: 10,
            scan_count: 100,
            max_display_chars: 4096,
            skip_undecodable: false,
        }
    }
}
